fn main() -> anyhow::Result<()> {
    assembly_rag::init_tracing();
    assembly_rag::interfaces::cli::run()
}
