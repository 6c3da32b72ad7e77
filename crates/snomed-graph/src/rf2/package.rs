//! RF2 package discovery.
//!
//! A package is a set of RF2 files from a release directory, a zip archive, or
//! byte buffers handed over by a caller. Files are classified by their
//! canonical file name fragment and release type; anything else is ignored.

use std::fs::{self, File};
use std::io::{BufReader, Cursor, Read};
use std::path::{Path, PathBuf};

use snomed_model::{
    ASSOCIATION_COLUMNS, ATTRIBUTE_VALUE_COLUMNS, CONCEPT_COLUMNS, CONCRETE_RELATIONSHIP_COLUMNS,
    DESCRIPTION_COLUMNS, LANGUAGE_REFSET_COLUMNS, MODULE_DEPENDENCY_COLUMNS, RELATIONSHIP_COLUMNS,
};

use crate::error::{GraphError, GraphResult};

/// The kind of content an RF2 file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rf2FileKind {
    /// `sct2_Concept_`
    Concept,
    /// `sct2_Description_`
    Description,
    /// `sct2_TextDefinition_`
    TextDefinition,
    /// `sct2_Relationship_`
    Relationship,
    /// `sct2_StatedRelationship_`
    StatedRelationship,
    /// `sct2_RelationshipConcreteValues_`
    ConcreteRelationship,
    /// `der2_cRefset_Language`
    LanguageRefset,
    /// `der2_cRefset_AttributeValue`
    AttributeValueRefset,
    /// `der2_cRefset_Association`
    AssociationRefset,
    /// `der2_ssRefset_ModuleDependency`
    ModuleDependency,
}

impl Rf2FileKind {
    const FRAGMENTS: [(&'static str, Rf2FileKind); 10] = [
        ("sct2_Concept_", Rf2FileKind::Concept),
        ("sct2_Description_", Rf2FileKind::Description),
        ("sct2_TextDefinition_", Rf2FileKind::TextDefinition),
        ("sct2_StatedRelationship_", Rf2FileKind::StatedRelationship),
        ("sct2_RelationshipConcreteValues_", Rf2FileKind::ConcreteRelationship),
        ("sct2_Relationship_", Rf2FileKind::Relationship),
        ("der2_cRefset_Language", Rf2FileKind::LanguageRefset),
        ("der2_cRefset_AttributeValue", Rf2FileKind::AttributeValueRefset),
        ("der2_cRefset_Association", Rf2FileKind::AssociationRefset),
        ("der2_ssRefset_ModuleDependency", Rf2FileKind::ModuleDependency),
    ];

    /// Load order: concepts, then descriptions, then relationships, then
    /// reference sets.
    pub fn load_index(self) -> u8 {
        match self {
            Rf2FileKind::Concept => 0,
            Rf2FileKind::Description | Rf2FileKind::TextDefinition => 1,
            Rf2FileKind::Relationship
            | Rf2FileKind::StatedRelationship
            | Rf2FileKind::ConcreteRelationship => 2,
            Rf2FileKind::LanguageRefset
            | Rf2FileKind::AttributeValueRefset
            | Rf2FileKind::AssociationRefset
            | Rf2FileKind::ModuleDependency => 3,
        }
    }

    /// Header row of files of this kind.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Rf2FileKind::Concept => &CONCEPT_COLUMNS,
            Rf2FileKind::Description | Rf2FileKind::TextDefinition => &DESCRIPTION_COLUMNS,
            Rf2FileKind::Relationship | Rf2FileKind::StatedRelationship => &RELATIONSHIP_COLUMNS,
            Rf2FileKind::ConcreteRelationship => &CONCRETE_RELATIONSHIP_COLUMNS,
            Rf2FileKind::LanguageRefset => &LANGUAGE_REFSET_COLUMNS,
            Rf2FileKind::AttributeValueRefset => &ATTRIBUTE_VALUE_COLUMNS,
            Rf2FileKind::AssociationRefset => &ASSOCIATION_COLUMNS,
            Rf2FileKind::ModuleDependency => &MODULE_DEPENDENCY_COLUMNS,
        }
    }
}

/// Snapshot or delta content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReleaseType {
    /// Full current state.
    Snapshot,
    /// Changes relative to a snapshot.
    Delta,
}

/// Classifies a file name.
///
/// Returns `None` for non-RF2 files and for `Full` or `Deleted` files.
///
/// # Examples
///
/// ```
/// use snomed_graph::rf2::{classify_file_name, ReleaseType, Rf2FileKind};
///
/// assert_eq!(
///     classify_file_name("der2_cRefset_LanguageDelta-en_INT_20250101.txt"),
///     Some((Rf2FileKind::LanguageRefset, ReleaseType::Delta))
/// );
/// assert_eq!(classify_file_name("sct2_Concept_Full_INT_20250101.txt"), None);
/// ```
pub fn classify_file_name(name: &str) -> Option<(Rf2FileKind, ReleaseType)> {
    if !name.ends_with(".txt") {
        return None;
    }
    let (fragment, kind) = Rf2FileKind::FRAGMENTS
        .iter()
        .find(|(fragment, _)| name.contains(fragment))?;

    let start = name.find(fragment)? + fragment.len();
    let rest = &name[start..];
    let release = if rest.starts_with("Snapshot") {
        ReleaseType::Snapshot
    } else if rest.starts_with("Delta") {
        ReleaseType::Delta
    } else {
        return None;
    };
    Some((*kind, release))
}

/// Extracts the release date from an RF2 file name.
///
/// RF2 files have names like `sct2_Concept_Snapshot_INT_20251201.txt`
pub fn extract_release_date(filename: &str) -> Option<String> {
    let without_ext = filename.trim_end_matches(".txt");
    let parts: Vec<&str> = without_ext.split('_').collect();

    if let Some(&last) = parts.last() {
        if last.len() == 8 && last.chars().all(|c| c.is_ascii_digit()) {
            return Some(last.to_string());
        }
    }

    None
}

#[derive(Debug, Clone)]
enum Location {
    File(PathBuf),
    ZipEntry { archive: PathBuf, entry: String },
    Memory(Vec<u8>),
}

/// One classified file in a package.
#[derive(Debug, Clone)]
pub struct Rf2Source {
    /// File name without directories.
    pub name: String,
    /// Content kind.
    pub kind: Rf2FileKind,
    /// Snapshot or delta.
    pub release: ReleaseType,
    location: Location,
}

/// A set of RF2 files ready to be loaded in index order.
#[derive(Debug, Clone, Default)]
pub struct Rf2Package {
    sources: Vec<Rf2Source>,
}

impl Rf2Package {
    /// Creates an empty package.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a release directory or a `.zip` archive.
    pub fn open<P: AsRef<Path>>(path: P) -> GraphResult<Self> {
        let path = path.as_ref();
        if path.is_dir() {
            Self::from_directory(path)
        } else if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("zip")) {
            Self::from_zip(path)
        } else {
            Err(GraphError::not_found("RF2 package", path.display()))
        }
    }

    /// Collects RF2 files from a directory tree.
    pub fn from_directory<P: AsRef<Path>>(path: P) -> GraphResult<Self> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(GraphError::not_found("RF2 directory", path.display()));
        }

        let mut package = Self::new();
        let mut pending = vec![path.to_path_buf()];
        while let Some(dir) = pending.pop() {
            for entry in fs::read_dir(&dir)? {
                let entry = entry?;
                let entry_path = entry.path();
                if entry.file_type()?.is_dir() {
                    pending.push(entry_path);
                    continue;
                }
                let name = entry.file_name().to_string_lossy().into_owned();
                package.push(name, Location::File(entry_path));
            }
        }
        package.sort();

        tracing::debug!("Discovered {} RF2 files under {}", package.len(), path.display());
        Ok(package)
    }

    /// Collects RF2 files from a zip archive.
    pub fn from_zip<P: AsRef<Path>>(path: P) -> GraphResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut archive = zip::ZipArchive::new(BufReader::new(file))?;

        let mut package = Self::new();
        for i in 0..archive.len() {
            let file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let entry = file.name().to_string();
            let name = entry.rsplit('/').next().unwrap_or(&entry).to_string();
            package.push(
                name,
                Location::ZipEntry {
                    archive: path.to_path_buf(),
                    entry,
                },
            );
        }
        package.sort();

        tracing::debug!("Discovered {} RF2 files in {}", package.len(), path.display());
        Ok(package)
    }

    /// Adds an in-memory file. Returns false if the name is not an RF2
    /// snapshot or delta file name.
    pub fn add_bytes(&mut self, name: impl Into<String>, bytes: Vec<u8>) -> bool {
        let added = self.push(name.into(), Location::Memory(bytes));
        self.sort();
        added
    }

    fn push(&mut self, name: String, location: Location) -> bool {
        match classify_file_name(&name) {
            Some((kind, release)) => {
                self.sources.push(Rf2Source {
                    name,
                    kind,
                    release,
                    location,
                });
                true
            }
            None => {
                tracing::debug!("Skipping {}", name);
                false
            }
        }
    }

    fn sort(&mut self) {
        self.sources.sort_by(|a, b| {
            (a.release, a.kind.load_index(), a.kind, &a.name).cmp(&(b.release, b.kind.load_index(), b.kind, &b.name))
        });
    }

    /// Files in load order: every snapshot file before any delta file, and
    /// within each, concepts, descriptions, relationships, reference sets.
    pub fn files(&self) -> &[Rf2Source] {
        &self.sources
    }

    /// Number of RF2 files.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// True if no RF2 file was found.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Release date of the first file that carries one.
    pub fn release_date(&self) -> Option<String> {
        self.sources.iter().find_map(|s| extract_release_date(&s.name))
    }

    /// Opens a file of this package for reading.
    pub fn open_source<'a>(&'a self, source: &'a Rf2Source) -> GraphResult<Box<dyn Read + 'a>> {
        match &source.location {
            Location::File(path) => Ok(Box::new(BufReader::new(File::open(path)?))),
            Location::ZipEntry { archive, entry } => {
                let mut archive = zip::ZipArchive::new(BufReader::new(File::open(archive)?))?;
                let mut file = archive.by_name(entry)?;
                let mut bytes = Vec::new();
                file.read_to_end(&mut bytes)?;
                Ok(Box::new(Cursor::new(bytes)))
            }
            Location::Memory(bytes) => Ok(Box::new(bytes.as_slice())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_file_names() {
        assert_eq!(
            classify_file_name("sct2_Concept_Snapshot_INT_20250101.txt"),
            Some((Rf2FileKind::Concept, ReleaseType::Snapshot))
        );
        assert_eq!(
            classify_file_name("sct2_Description_Delta-en_INT_20250101.txt"),
            Some((Rf2FileKind::Description, ReleaseType::Delta))
        );
        assert_eq!(
            classify_file_name("sct2_RelationshipConcreteValues_Snapshot_INT_20250101.txt"),
            Some((Rf2FileKind::ConcreteRelationship, ReleaseType::Snapshot))
        );
        assert_eq!(
            classify_file_name("sct2_Relationship_Snapshot_INT_20250101.txt"),
            Some((Rf2FileKind::Relationship, ReleaseType::Snapshot))
        );
        assert_eq!(
            classify_file_name("der2_ssRefset_ModuleDependencySnapshot_INT_20250101.txt"),
            Some((Rf2FileKind::ModuleDependency, ReleaseType::Snapshot))
        );
        assert_eq!(classify_file_name("sct2_Concept_Deleted_INT_20250101.txt"), None);
        assert_eq!(classify_file_name("der2_Refset_SimpleSnapshot_INT_20250101.txt"), None);
        assert_eq!(classify_file_name("Readme_en_20250101.txt"), None);
    }

    #[test]
    fn test_extract_release_date() {
        assert_eq!(
            extract_release_date("sct2_Description_Snapshot-en_INT_20251201.txt"),
            Some("20251201".to_string())
        );
        assert_eq!(extract_release_date("invalid_filename.txt"), None);
    }

    #[test]
    fn test_files_are_in_load_order() {
        let mut package = Rf2Package::new();
        assert!(package.add_bytes("der2_cRefset_LanguageDelta-en_INT_20250101.txt", Vec::new()));
        assert!(package.add_bytes("sct2_Relationship_Snapshot_INT_20250101.txt", Vec::new()));
        assert!(package.add_bytes("sct2_Concept_Delta_INT_20250101.txt", Vec::new()));
        assert!(package.add_bytes("sct2_Description_Snapshot-en_INT_20250101.txt", Vec::new()));
        assert!(package.add_bytes("sct2_Concept_Snapshot_INT_20250101.txt", Vec::new()));
        assert!(!package.add_bytes("notes.txt", Vec::new()));

        let order: Vec<(Rf2FileKind, ReleaseType)> =
            package.files().iter().map(|s| (s.kind, s.release)).collect();
        assert_eq!(
            order,
            vec![
                (Rf2FileKind::Concept, ReleaseType::Snapshot),
                (Rf2FileKind::Description, ReleaseType::Snapshot),
                (Rf2FileKind::Relationship, ReleaseType::Snapshot),
                (Rf2FileKind::Concept, ReleaseType::Delta),
                (Rf2FileKind::LanguageRefset, ReleaseType::Delta),
            ]
        );
        assert_eq!(package.release_date(), Some("20250101".to_string()));
    }

    #[test]
    fn test_directory_discovery_is_recursive() {
        let dir = tempfile::tempdir().unwrap();
        let terminology = dir.path().join("Snapshot").join("Terminology");
        fs::create_dir_all(&terminology).unwrap();
        fs::write(terminology.join("sct2_Concept_Snapshot_INT_20250101.txt"), "").unwrap();
        fs::write(dir.path().join("release_notes.txt"), "").unwrap();

        let package = Rf2Package::open(dir.path()).unwrap();
        assert_eq!(package.len(), 1);
        assert_eq!(package.files()[0].kind, Rf2FileKind::Concept);
    }

    #[test]
    fn test_missing_path_is_not_found() {
        let result = Rf2Package::open("/definitely/not/here");
        assert!(matches!(result, Err(GraphError::NotFound { .. })));
    }
}
