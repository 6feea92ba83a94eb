#[tokio::main]
async fn main() -> anyhow::Result<()> {
    balance_book::cli::run_with_sys_args().await
}
