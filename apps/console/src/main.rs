fn main() -> anyhow::Result<()> {
    speaking_drill_console::run()
}
