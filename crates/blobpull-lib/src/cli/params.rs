use crate::download::DownloadOptions;
use crate::paths::TransformRules;

#[derive(Clone)]
pub struct DownloadParams {
    pub paths: Vec<String>,
    pub container: Option<String>,
    /// Present only when `--transform` was given.
    pub transform: Option<TransformRules>,
    /// Required unless this is a dry run.
    pub connection_string: Option<String>,
    pub options: DownloadOptions,
}

impl std::fmt::Debug for DownloadParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadParams")
            .field("paths", &self.paths)
            .field("container", &self.container)
            .field("transform", &self.transform)
            .field(
                "connection_string",
                &self.connection_string.as_ref().map(|_| "<redacted>"),
            )
            .field("options", &self.options)
            .finish()
    }
}
