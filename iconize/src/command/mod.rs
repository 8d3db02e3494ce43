use crate::ServeArgs;
use anyhow::Result;

mod pack;

pub use pack::pack;

pub fn serve(args: &ServeArgs) -> Result<()> {
    let config = args.config()?;
    tracing::debug!("{:?}", config);
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(crate::server::serve(config))
}
