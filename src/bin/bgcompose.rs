//! Background Compositing CLI Tool
//!
//! Command-line interface for removing backgrounds and recompositing the
//! subject onto a new background using the bgcompose library.

use bgcompose::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}
