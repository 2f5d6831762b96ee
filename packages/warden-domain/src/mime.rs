use std::path::Path;

pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// Guesses a content type from the extension of `path`, falling back to `text/plain`.
pub fn guess_content_type(path: &str) -> &'static str {
	let Some(ext) = Path::new(path).extension().and_then(|ext| ext.to_str()) else {
		return DEFAULT_CONTENT_TYPE;
	};

	match ext.to_ascii_lowercase().as_str() {
		"txt" | "text" | "log" => "text/plain",
		"md" | "markdown" => "text/markdown",
		"csv" => "text/csv",
		"htm" | "html" => "text/html",
		"css" => "text/css",
		"js" | "mjs" => "text/javascript",
		"py" => "text/x-python",
		"rs" => "text/x-rust",
		"json" => "application/json",
		"xml" => "application/xml",
		"yaml" | "yml" => "application/yaml",
		"toml" => "application/toml",
		"pdf" => "application/pdf",
		"zip" => "application/zip",
		"png" => "image/png",
		"jpg" | "jpeg" => "image/jpeg",
		"gif" => "image/gif",
		"svg" => "image/svg+xml",
		_ => DEFAULT_CONTENT_TYPE,
	}
}
