//! Prompt construction for extraction, compilation and JSON repair

use crate::error::ExtractorError;
use pcascan_domain::{Chunk, ExtractedRow};
use std::collections::BTreeMap;
use std::path::Path;

/// The controlled PCA vocabulary embedded in every prompt
///
/// Lines shaped like `28. Gasoline Storage`, `28) Gasoline Storage` or
/// `28 Gasoline Storage` become numbered entries; any other non-empty line
/// is kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PcaCatalog {
    names: BTreeMap<u32, String>,
    lines: Vec<String>,
}

impl PcaCatalog {
    /// Parse catalog text
    pub fn parse(text: &str) -> Self {
        let mut names = BTreeMap::new();
        let mut lines = Vec::new();

        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match split_numbered(line) {
                Some((number, name)) => {
                    lines.push(format!("{}. {}", number, name));
                    names.insert(number, name.to_string());
                }
                None => lines.push(line.to_string()),
            }
        }

        Self { names, lines }
    }

    /// Load a catalog file
    pub fn load(path: &Path) -> Result<Self, ExtractorError> {
        if !path.exists() {
            return Err(ExtractorError::NotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    /// Number of numbered entries
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the catalog has no numbered entries
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name of entry `number`
    pub fn name(&self, number: u32) -> Option<&str> {
        self.names.get(&number).map(String::as_str)
    }

    /// Catalog as embedded in prompts
    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

// `^\s*(\d+)\s*[.)]?\s*(.+)$` on an already trimmed line
fn split_numbered(line: &str) -> Option<(u32, &str)> {
    let digits_end = line
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(line.len(), |(i, _)| i);
    if digits_end == 0 {
        return None;
    }
    let number = line[..digits_end].parse().ok()?;

    let rest = line[digits_end..].trim_start();
    let rest = rest
        .strip_prefix('.')
        .or_else(|| rest.strip_prefix(')'))
        .unwrap_or(rest)
        .trim();
    if rest.is_empty() {
        return None;
    }
    Some((number, rest))
}

/// Built-in extraction instructions
pub const DEFAULT_INSTRUCTIONS: &str = r#"Extract every PCA (Potentially Contaminating Activity) entry from the environmental report text below.

Create a SEPARATE row for each unique (address, PCA) combination:
- An address with several activities gets one row per activity
- Keep unit and suite numbers exactly as written (e.g. "670 Progress Avenue Unit 8")
- Include both on-site and off-site activities
- Include historical operations, city directory listings and businesses marked out of business
- Activities outside the numbered list (spills, de-icing salt, UST/AST removal, PCB storage) get pca_number null

Return STRICT JSON with this schema:

{
  "rows": [
    {
      "address": "string",
      "location_relation_to_site": "string",
      "pca_number": 1,
      "pca_name": "string",
      "description_timeline": "string",
      "source_pages": "start-end"
    }
  ]
}

pca_number is an integer from the official list below, or null.
description_timeline holds business names, operations, dates and waste types."#;

const COMPILE_INSTRUCTIONS: &str = r#"You are deduplicating and compiling PCA rows extracted from multiple document chunks.

Merge duplicate rows. Two rows are duplicates when they have the same or a very similar address (ignore "Ave" vs "Avenue" and unit formatting) AND the same PCA number. When merging, keep the most complete address, combine descriptions and business names, and merge source_pages (e.g. "48-52; 67").

Keep rows separate when the PCA numbers differ or the street numbers differ.

Also:
1. Normalize location_relation_to_site to exactly "On-Site" or "Off-Site"
2. Fill in pca_number when the PCA type is recognizable from pca_name
3. REMOVE rows without a valid pca_number (1-59) or without sufficient evidence

Return ONLY valid JSON:
{"rows": [{"address": "string", "location_relation_to_site": "On-Site", "pca_number": 1, "pca_name": "string", "description_timeline": "string", "source_pages": "string"}]}"#;

const REPAIR_INSTRUCTIONS: &str = "The following text was meant to be strict JSON but is not valid.\nReturn a valid JSON object ONLY. Do not add commentary.";

/// Builds the prompts sent to the model
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    instructions: String,
    catalog: String,
}

impl PromptBuilder {
    /// Create a builder from extraction instructions and a catalog
    pub fn new(instructions: impl Into<String>, catalog: &PcaCatalog) -> Self {
        Self {
            instructions: instructions.into(),
            catalog: catalog.render(),
        }
    }

    /// Create a builder using [`DEFAULT_INSTRUCTIONS`]
    pub fn with_default_instructions(catalog: &PcaCatalog) -> Self {
        Self::new(DEFAULT_INSTRUCTIONS, catalog)
    }

    /// Read extraction instructions from a template file
    pub fn load_instructions(path: &Path) -> Result<String, ExtractorError> {
        if !path.exists() {
            return Err(ExtractorError::NotFound(path.to_path_buf()));
        }
        Ok(std::fs::read_to_string(path)?)
    }

    /// Prompt for a single chunk
    pub fn chunk_prompt(&self, chunk: &Chunk) -> String {
        let mut prompt = String::with_capacity(self.instructions.len() + self.catalog.len());
        prompt.push_str(self.instructions.trim_end());
        prompt.push_str("\n\nOfficial PCA list (for mapping):\n");
        prompt.push_str(&self.catalog);
        prompt.push_str(&format!(
            "\n\n## Document Text (Pages {}-{})\n\n",
            chunk.start, chunk.end
        ));
        prompt.push_str(&chunk.text());
        prompt
    }

    /// Prompt for the cross-chunk compile pass
    pub fn compile_prompt(&self, rows: &[ExtractedRow]) -> Result<String, ExtractorError> {
        let rows_json = serde_json::to_string_pretty(rows)?;
        Ok(format!(
            "{}\n\n=== PCA REFERENCE ===\n{}\n\n=== RAW ROWS TO DEDUPLICATE ===\n{}\n",
            COMPILE_INSTRUCTIONS, self.catalog, rows_json
        ))
    }

    /// Prompt asking the model to turn `raw` into valid JSON
    pub fn repair_prompt(raw: &str) -> String {
        format!("{}\n\nText:\n{}\n", REPAIR_INSTRUCTIONS, raw)
    }
}
