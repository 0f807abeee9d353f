use std::process;

use tokio::task::LocalSet;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let exit_code = LocalSet::new().run_until(crawldesk_console::run()).await;
    process::exit(exit_code);
}
