fn main() -> anyhow::Result<()> {
    notes_list::cli::run()
}
