//! Static HTML report: one section per adjective, one card per animal.

use std::fmt::Write as _;
use std::path::{Component, Path, PathBuf};

use crate::error::{BestiaryError, Result};
use crate::models::{AdjectiveIndex, CanonicalKey, ResultMap};

const TITLE: &str = "Animal Collateral Adjectives";

const STYLE: &str = r#"
    body { font-family: Arial, sans-serif; margin: 20px; background: #f0f2f5; }
    h1 { text-align: center; }
    h2 { margin-top: 40px; color: #333; }
    .grid { display: flex; flex-wrap: wrap; gap: 20px; }
    .card {
        background: white;
        border-radius: 8px;
        box-shadow: 0 2px 8px rgba(0,0,0,0.1);
        padding: 10px;
        width: 180px;
        text-align: center;
    }
    .card img {
        max-width: 100%;
        height: 120px;
        object-fit: cover;
        border-radius: 4px;
    }
    .placeholder { height: 120px; background: #ccc; border-radius: 4px; }
"#;

/// Renders the report and writes it to `output_file`, creating its directory.
pub fn render_report(index: &AdjectiveIndex, results: &ResultMap, output_file: &Path) -> Result<()> {
    let out_dir = match output_file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&out_dir)?;
    let html = render_html(index, results, &out_dir)?;
    std::fs::write(output_file, html)?;
    Ok(())
}

/// Builds the report document. Image paths are made relative to `out_dir`.
pub fn render_html(index: &AdjectiveIndex, results: &ResultMap, out_dir: &Path) -> Result<String> {
    let base = absolute(out_dir)?;
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html><head>\n<meta charset=\"UTF-8\">\n");
    html.push_str(
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
    );
    let _ = writeln!(html, "<title>{TITLE}</title>");
    let _ = writeln!(html, "<style>{STYLE}</style>");
    html.push_str("</head><body>\n");
    let _ = writeln!(html, "<h1>{TITLE}</h1>");

    for (adjective, animals) in index.iter() {
        let _ = write!(
            html,
            "<h2>{}</h2><div class='grid'>",
            escape_html(&capitalize(adjective))
        );

        let mut sorted: Vec<&String> = animals.iter().collect();
        sorted.sort();

        for animal in sorted {
            let key = CanonicalKey::from_raw(animal);
            let image = results.image_for(&key).filter(|path| path.exists());
            let img_tag = match image {
                Some(path) => {
                    let target = absolute(path)?;
                    let rel = relative_path(&base, &target);
                    format!(
                        "<img src=\"{}\" alt=\"{}\"/>",
                        escape_html(&to_url_path(&rel)),
                        escape_html(animal)
                    )
                }
                None => "<div class=\"placeholder\"></div>".to_string(),
            };
            let _ = write!(
                html,
                "<div class='card'>{img_tag}<div>{}</div></div>",
                escape_html(animal)
            );
        }
        html.push_str("</div>\n");
    }

    html.push_str("</body></html>\n");
    Ok(html)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if let Ok(canonical) = path.canonicalize() {
        return Ok(canonical);
    }
    let cwd = std::env::current_dir()
        .map_err(|e| BestiaryError::RenderError(format!("no working directory: {e}")))?;
    Ok(cwd.join(path))
}

/// Path from directory `from` to `to`, both absolute.
fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from: Vec<Component> = from.components().collect();
    let to: Vec<Component> = to.components().collect();
    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..from.len() {
        rel.push("..");
    }
    for comp in &to[common..] {
        rel.push(comp.as_os_str());
    }
    rel
}

fn to_url_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
