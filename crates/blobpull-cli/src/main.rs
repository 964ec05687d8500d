use blobpull_lib::cli::{parse_args, resolve_request, run_download};

#[tokio::main(flavor = "current_thread")]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = parse_args();
    let params = resolve_request(args.request)?;
    run_download(params).await?;

    Ok(())
}
