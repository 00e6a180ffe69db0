use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};

use crate::domain::graph::Graph;
use crate::ports::dot_exporter::DotExporter;
use crate::ports::{DiagramRenderer, OutputExporter};

/// Renders DOT to SVG with the Graphviz `dot` program.
pub struct GraphvizRenderer {
    /// Program to run, `dot` unless configured otherwise.
    pub command: String,
}

impl Default for GraphvizRenderer {
    fn default() -> Self {
        Self {
            command: "dot".to_string(),
        }
    }
}

impl DiagramRenderer for GraphvizRenderer {
    fn render(&self, dot: &str) -> Result<Vec<u8>> {
        let mut child = Command::new(&self.command)
            .arg("-Tsvg")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to execute '{}'. Is Graphviz installed?", self.command))?;

        // Write on a separate thread so a large graph cannot deadlock against
        // a full stdout pipe.
        let mut stdin = child.stdin.take().context("dot stdin was not captured")?;
        let input = dot.to_string();
        let writer = std::thread::spawn(move || stdin.write_all(input.as_bytes()));

        let output = child
            .wait_with_output()
            .with_context(|| format!("Failed to wait for '{}'", self.command))?;
        writer
            .join()
            .map_err(|_| anyhow::anyhow!("dot stdin writer panicked"))?
            .context("Failed to write DOT to dot stdin")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("{} failed: {}", self.command, stderr.trim());
        }

        let svg = String::from_utf8(output.stdout).context("dot output was not valid UTF-8")?;
        Ok(massage_svg(&svg).into_bytes())
    }
}

/// Exports graphs as cleaned-up SVG through a [`DiagramRenderer`].
pub struct SvgExporter<R: DiagramRenderer> {
    pub renderer: R,
}

impl<R: DiagramRenderer> OutputExporter for SvgExporter<R> {
    fn export(&self, graph: &Graph) -> Result<Vec<u8>> {
        self.renderer.render(&DotExporter::to_dot(graph))
    }
}

/// Tidy Graphviz SVG for embedding: drop the XML prolog, doctype and
/// comments, and drop the fixed `width`/`height` of the root element so the
/// `viewBox` decides the scale.
pub fn massage_svg(svg: &str) -> String {
    let mut out = String::with_capacity(svg.len());
    let mut rest = svg;
    while !rest.is_empty() {
        let skip = ["<?", "<!DOCTYPE", "<!--"]
            .iter()
            .zip(["?>", ">", "-->"])
            .find(|(open, _)| rest.starts_with(**open));
        if let Some((_, close)) = skip {
            match rest.find(close) {
                Some(end) => {
                    rest = rest[end + close.len()..].trim_start_matches(['\r', '\n']);
                    continue;
                }
                None => break,
            }
        }
        let next = rest
            .char_indices()
            .skip(1)
            .find(|&(_, c)| c == '<')
            .map_or(rest.len(), |(i, _)| i);
        out.push_str(&rest[..next]);
        rest = &rest[next..];
    }

    if let Some(start) = out.find("<svg") {
        let end = out[start..].find('>').map_or(out.len(), |i| start + i);
        let tag = strip_attr(&strip_attr(&out[start..end], "width"), "height");
        out.replace_range(start..end, &tag);
    }
    out
}

/// Remove ` name="..."` from a tag.
fn strip_attr(tag: &str, name: &str) -> String {
    let needle = format!(" {}=\"", name);
    let Some(start) = tag.find(&needle) else {
        return tag.to_string();
    };
    let value_start = start + needle.len();
    match tag[value_start..].find('"') {
        Some(len) => format!("{}{}", &tag[..start], &tag[value_start + len + 1..]),
        None => tag.to_string(),
    }
}
