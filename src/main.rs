pub fn main() -> miette::Result<()> {
    pywheel_cli::execute()
}
