use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};
use thiserror::Error;
use tracing::{info, warn};

use super::fighter::{FighterDescriptor, Rgb, Sprite, PLACEHOLDER_ICON_SIZE};

pub const FIGHTER_FILE_NAME: &str = "fighter.xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FighterErrorCode {
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    UnknownField,
    DuplicateField,
    MissingField,
    InvalidValue,
}

#[derive(Debug, Clone)]
pub struct FighterLoadError {
    pub code: FighterErrorCode,
    pub message: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for FighterLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (file={}, line={}, column={})",
                self.code,
                self.message,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (file={})",
                self.code,
                self.message,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for FighterLoadError {}

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("failed to read fighter directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Fighters that loaded, in directory order, plus the ones that were skipped.
#[derive(Debug, Default)]
pub struct RosterLoad {
    pub fighters: Vec<FighterDescriptor>,
    pub failures: Vec<FighterLoadError>,
}

/// Scans `fighters_dir` for `*/fighter.xml`. A broken fighter is skipped with a
/// diagnostic; only an unreadable directory fails the whole load.
pub fn load_roster(fighters_dir: &Path) -> Result<RosterLoad, RosterError> {
    let entries = fs::read_dir(fighters_dir).map_err(|source| RosterError::ReadDir {
        path: fighters_dir.to_path_buf(),
        source,
    })?;

    let mut dirs = Vec::<PathBuf>::new();
    for entry in entries {
        let entry = entry.map_err(|source| RosterError::ReadDir {
            path: fighters_dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if path.is_dir() && !hidden && path.join(FIGHTER_FILE_NAME).is_file() {
            dirs.push(path);
        }
    }
    dirs.sort();

    let mut roster = RosterLoad::default();
    let mut seen_ids = HashSet::<String>::new();
    for dir in dirs {
        match load_fighter(&dir) {
            Ok(fighter) => {
                if !seen_ids.insert(fighter.id.clone()) {
                    let error = FighterLoadError {
                        code: FighterErrorCode::InvalidValue,
                        message: format!("duplicate defName '{}'", fighter.id),
                        file_path: dir.join(FIGHTER_FILE_NAME),
                        location: None,
                    };
                    warn!(error = %error, "fighter_skipped");
                    roster.failures.push(error);
                    continue;
                }
                info!(
                    fighter = %fighter.id,
                    palette = fighter.palette.len(),
                    costumes = fighter.costume_count,
                    "fighter_loaded"
                );
                roster.fighters.push(fighter);
            }
            Err(error) => {
                warn!(error = %error, "fighter_skipped");
                roster.failures.push(error);
            }
        }
    }

    Ok(roster)
}

pub fn load_fighter(dir: &Path) -> Result<FighterDescriptor, FighterLoadError> {
    let file_path = dir.join(FIGHTER_FILE_NAME);
    let raw = fs::read_to_string(&file_path).map_err(|error| FighterLoadError {
        code: FighterErrorCode::ReadFile,
        message: format!("read failed: {error}"),
        file_path: file_path.clone(),
        location: None,
    })?;
    let pending = parse_fighter_document(&file_path, &raw)?;

    let base_color = pending.palette.first().copied().unwrap_or(Rgb::NEUTRAL);
    let css_icon = load_icon(dir, pending.css_icon.as_deref(), &pending.def_name, base_color);
    let franchise_icon = load_icon(
        dir,
        pending.franchise_icon.as_deref(),
        &pending.def_name,
        Rgb::NEUTRAL,
    );

    Ok(FighterDescriptor {
        id: pending.def_name,
        name: pending.label,
        source_dir: dir.to_path_buf(),
        css_icon,
        franchise_icon,
        palette: pending.palette,
        costume_count: pending.costume_count,
    })
}

fn load_icon(dir: &Path, rel_path: Option<&str>, fighter: &str, fallback: Rgb) -> Sprite {
    let Some(rel_path) = rel_path else {
        return Sprite::placeholder(PLACEHOLDER_ICON_SIZE, fallback);
    };
    let path = dir.join(rel_path);
    match Sprite::load(&path) {
        Ok(sprite) => sprite,
        Err(reason) => {
            warn!(
                fighter,
                path = %path.display(),
                reason = %reason,
                "fighter_icon_load_failed_using_placeholder"
            );
            Sprite::placeholder(PLACEHOLDER_ICON_SIZE, fallback)
        }
    }
}

#[derive(Debug, Clone)]
struct PendingFighter {
    def_name: String,
    label: String,
    css_icon: Option<String>,
    franchise_icon: Option<String>,
    palette: Vec<Rgb>,
    costume_count: u32,
}

fn parse_fighter_document(file_path: &Path, raw: &str) -> Result<PendingFighter, FighterLoadError> {
    let doc = Document::parse(raw).map_err(|error| FighterLoadError {
        code: FighterErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })?;

    let root = doc.root_element();
    if root.tag_name().name() != "FighterDef" {
        return Err(error_at_node(
            FighterErrorCode::InvalidRoot,
            "root element must be <FighterDef>".to_string(),
            file_path,
            &doc,
            root,
        ));
    }

    let mut seen_fields = HashSet::<String>::new();
    let mut def_name: Option<String> = None;
    let mut label: Option<String> = None;
    let mut css_icon: Option<String> = None;
    let mut franchise_icon: Option<String> = None;
    let mut palette: Option<Vec<Rgb>> = None;
    let mut costume_count: Option<u32> = None;

    for field in root.children().filter(|child| child.is_element()) {
        let field_name = field.tag_name().name().to_string();
        if !seen_fields.insert(field_name.clone()) {
            return Err(error_at_node(
                FighterErrorCode::DuplicateField,
                format!("duplicate field <{}> in <FighterDef>", field_name),
                file_path,
                &doc,
                field,
            ));
        }

        match field_name.as_str() {
            "defName" => def_name = Some(required_text(file_path, &doc, field, "defName")?),
            "label" => label = Some(required_text(file_path, &doc, field, "label")?),
            "cssIcon" => css_icon = Some(required_text(file_path, &doc, field, "cssIcon")?),
            "franchiseIcon" => {
                franchise_icon = Some(required_text(file_path, &doc, field, "franchiseIcon")?)
            }
            "palette" => palette = Some(parse_palette(file_path, &doc, field)?),
            "costumes" => {
                let value = required_text(file_path, &doc, field, "costumes")?;
                let parsed = value.parse::<u32>().ok().filter(|count| *count >= 1);
                let Some(parsed) = parsed else {
                    return Err(error_at_node(
                        FighterErrorCode::InvalidValue,
                        format!("costumes '{}' must be an integer >= 1", value),
                        file_path,
                        &doc,
                        field,
                    ));
                };
                costume_count = Some(parsed);
            }
            _ => {
                return Err(error_at_node(
                    FighterErrorCode::UnknownField,
                    format!("unknown field <{}> in <FighterDef>", field_name),
                    file_path,
                    &doc,
                    field,
                ))
            }
        }
    }

    let Some(def_name) = def_name else {
        return Err(error_at_node(
            FighterErrorCode::MissingField,
            "missing required field <defName> in <FighterDef>".to_string(),
            file_path,
            &doc,
            root,
        ));
    };
    let Some(label) = label else {
        return Err(error_at_node(
            FighterErrorCode::MissingField,
            "missing required field <label> in <FighterDef>".to_string(),
            file_path,
            &doc,
            root,
        ));
    };

    Ok(PendingFighter {
        def_name,
        label,
        css_icon,
        franchise_icon,
        palette: palette
            .filter(|colors| !colors.is_empty())
            .unwrap_or_else(|| vec![Rgb::NEUTRAL]),
        costume_count: costume_count.unwrap_or(1),
    })
}

fn parse_palette(
    file_path: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
) -> Result<Vec<Rgb>, FighterLoadError> {
    let mut colors = Vec::new();
    for item in node.children().filter(|child| child.is_element()) {
        if item.tag_name().name() != "li" {
            return Err(error_at_node(
                FighterErrorCode::UnknownField,
                format!("<palette> may only contain <li>, found <{}>", item.tag_name().name()),
                file_path,
                doc,
                item,
            ));
        }
        let value = required_text(file_path, doc, item, "li")?;
        let color = Rgb::parse(&value).map_err(|error| {
            error_at_node(
                FighterErrorCode::InvalidValue,
                error.to_string(),
                file_path,
                doc,
                item,
            )
        })?;
        colors.push(color);
    }
    Ok(colors)
}

fn required_text(
    file_path: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
    field_name: &str,
) -> Result<String, FighterLoadError> {
    let value = node.text().map(str::trim).unwrap_or_default().to_string();
    if value.is_empty() {
        return Err(error_at_node(
            FighterErrorCode::MissingField,
            format!("field <{}> must not be empty", field_name),
            file_path,
            doc,
            node,
        ));
    }
    Ok(value)
}

fn error_at_node(
    code: FighterErrorCode,
    message: String,
    file_path: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
) -> FighterLoadError {
    let pos = doc.text_pos_at(node.range().start);
    FighterLoadError {
        code,
        message,
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: pos.row as usize,
            column: pos.col as usize,
        }),
    }
}
