use std::path::Path;
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::config::FontConfig;
use crate::font::{FontFace, FontInstance, FontProvider, Result};
use crate::style::{FontStyle, Style};

/// Font provider backed by a `fontdb` database.
///
/// Faces are loaded lazily on first use and cached by database id; the
/// cache is guarded so one provider can serve concurrent layouts.
#[derive(Default)]
pub struct FontDbProvider {
    db: fontdb::Database,
    faces: RwLock<HashMap<fontdb::ID, Arc<FontFace>>>,
}

impl std::fmt::Debug for FontDbProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontDbProvider")
            .field("faces", &self.db.len())
            .field("loaded", &self.faces.read().len())
            .finish()
    }
}

impl FontDbProvider {
    pub fn new(db: fontdb::Database) -> Self {
        Self {
            db,
            faces: RwLock::new(HashMap::new()),
        }
    }

    /// Build a database from the font directories and system-font setting
    /// in `config`.
    pub fn from_config(config: &FontConfig) -> Self {
        let mut db = fontdb::Database::new();
        if config.load_system_fonts {
            db.load_system_fonts();
        }
        for dir in &config.font_dirs {
            db.load_fonts_dir(dir);
        }
        tracing::debug!(faces = db.len(), "font database ready");
        Self::new(db)
    }

    /// Add a single font file to the database.
    pub fn load_font_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.db.load_font_file(path)?;
        Ok(())
    }

    pub fn database(&self) -> &fontdb::Database {
        &self.db
    }

    fn load_face(&self, id: fontdb::ID) -> Option<Arc<FontFace>> {
        if let Some(face) = self.faces.read().get(&id) {
            return Some(face.clone());
        }
        let family = self
            .db
            .face(id)
            .and_then(|info| info.families.first().map(|(name, _)| name.clone()))
            .unwrap_or_default();
        let face = self
            .db
            .with_face_data(id, |data, index| {
                FontFace::from_vec(data.to_vec(), index as usize, family.clone())
            })?
            .map_err(|err| tracing::warn!(%err, family = %family, "failed to load font face"))
            .ok()?;
        let face = Arc::new(face);
        self.faces.write().insert(id, face.clone());
        Some(face)
    }
}

impl FontProvider for FontDbProvider {
    fn resolve(&self, style: &Style) -> Option<Arc<dyn FontInstance>> {
        let families: Vec<fontdb::Family<'_>> = style
            .font_family
            .iter()
            .map(|name| match name.as_str() {
                "serif" => fontdb::Family::Serif,
                "sans-serif" => fontdb::Family::SansSerif,
                "monospace" => fontdb::Family::Monospace,
                "cursive" => fontdb::Family::Cursive,
                "fantasy" => fontdb::Family::Fantasy,
                other => fontdb::Family::Name(other),
            })
            .collect();
        let query = fontdb::Query {
            families: &families,
            weight: fontdb::Weight(style.font_weight),
            stretch: fontdb::Stretch::Normal,
            style: match style.font_style {
                FontStyle::Normal => fontdb::Style::Normal,
                FontStyle::Italic => fontdb::Style::Italic,
                FontStyle::Oblique => fontdb::Style::Oblique,
            },
        };
        let Some(id) = self.db.query(&query) else {
            tracing::warn!(families = ?style.font_family, "no font matches style");
            return None;
        };
        self.load_face(id).map(|face| face as Arc<dyn FontInstance>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_database_resolves_nothing() {
        let provider = FontDbProvider::new(fontdb::Database::new());
        assert!(provider.resolve(&Style::default()).is_none());
    }

    #[test]
    fn missing_font_file_is_an_error() {
        let mut provider = FontDbProvider::default();
        assert!(provider.load_font_file("/nonexistent/font.ttf").is_err());
    }
}
