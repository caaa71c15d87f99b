use crate::error::CatalogError;
use gazecue_core::{
    GazeDirection, ImageId, Species, StimulusAsset, TargetAsset, TargetLetter, TargetSide,
};
use std::fmt::Display;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: [&str; 3] = ["tif", "tiff", "png"];

/// Which list an image file is destined for; lets a loader scale differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Stimulus,
    Target,
}

/// Tagged stimulus and target assets plus the image store they index into.
///
/// Built once per session and passed by reference; trials carry [`ImageId`]s
/// rather than images.
#[derive(Debug, Clone)]
pub struct Catalog<I> {
    stimuli: Vec<StimulusAsset>,
    targets: Vec<TargetAsset>,
    images: Vec<I>,
}

impl<I> Default for Catalog<I> {
    fn default() -> Self {
        Self {
            stimuli: Vec::new(),
            targets: Vec::new(),
            images: Vec::new(),
        }
    }
}

impl<I> Catalog<I> {
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&mut self, image: I) -> ImageId {
        self.images.push(image);
        ImageId(self.images.len() - 1)
    }

    pub fn add_stimulus(
        &mut self,
        species: Species,
        gaze_direction: GazeDirection,
        number: u32,
        image: I,
    ) -> StimulusAsset {
        let asset = StimulusAsset {
            species,
            gaze_direction,
            number,
            image: self.store(image),
        };
        self.stimuli.push(asset);
        asset
    }

    /// Adds one letter image, placed once on each side of the screen.
    pub fn add_target_letter(&mut self, letter: TargetLetter, image: I) -> [TargetAsset; 2] {
        let image = self.store(image);
        let placed = TargetSide::BOTH.map(|side| TargetAsset {
            letter,
            side,
            image,
        });
        self.targets.extend(placed);
        placed
    }

    pub fn stimuli(&self) -> &[StimulusAsset] {
        &self.stimuli
    }

    pub fn targets(&self) -> &[TargetAsset] {
        &self.targets
    }

    pub fn images(&self) -> &[I] {
        &self.images
    }

    pub fn is_empty(&self) -> bool {
        self.stimuli.is_empty() || self.targets.is_empty()
    }

    /// Hands over the image store; asset handles index into it.
    pub fn into_images(self) -> Vec<I> {
        self.images
    }

    /// Loads stimuli recursively from `stimuli_dir` and targets from the top
    /// level of `targets_dir`, tagging each from its file name.
    pub fn load<F, E>(
        stimuli_dir: &Path,
        targets_dir: &Path,
        mut load_image: F,
    ) -> Result<Self, CatalogError>
    where
        F: FnMut(&Path, AssetKind) -> Result<I, E>,
        E: Display,
    {
        let mut catalog = Self::new();

        for path in find_images(stimuli_dir, true)? {
            let relative = path.strip_prefix(stimuli_dir).unwrap_or(&path);
            let (species, gaze, number) = stimulus_tags(relative)?;
            let image = load_one(&mut load_image, &path, AssetKind::Stimulus)?;
            catalog.add_stimulus(species, gaze, number, image);
        }

        for path in find_images(targets_dir, false)? {
            let letter = target_letter(&path);
            let image = load_one(&mut load_image, &path, AssetKind::Target)?;
            catalog.add_target_letter(letter, image);
        }

        log::info!(
            "Catalog loaded: {} stimuli from {}, {} targets from {}",
            catalog.stimuli.len(),
            stimuli_dir.display(),
            catalog.targets.len(),
            targets_dir.display()
        );
        if catalog.is_empty() {
            log::warn!("Catalog is empty; the session will have no trials");
        }
        Ok(catalog)
    }
}

fn load_one<I, E: Display>(
    load_image: &mut impl FnMut(&Path, AssetKind) -> Result<I, E>,
    path: &Path,
    kind: AssetKind,
) -> Result<I, CatalogError> {
    load_image(path, kind).map_err(|e| CatalogError::Image {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn find_images(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>, CatalogError> {
    let root = glob::Pattern::escape(&dir.to_string_lossy());
    let mut paths = Vec::new();
    for ext in IMAGE_EXTENSIONS {
        let pattern = if recursive {
            format!("{root}/**/*.{ext}")
        } else {
            format!("{root}/*.{ext}")
        };
        let entries = glob::glob(&pattern).map_err(|e| CatalogError::Pattern(e.to_string()))?;
        for entry in entries {
            let path = entry.map_err(|e| CatalogError::Io {
                path: e.path().to_path_buf(),
                source: e.into_error(),
            })?;
            paths.push(path);
        }
    }
    paths.sort();
    paths.dedup();
    Ok(paths)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Reads species, gaze direction and image number from a stimulus path
/// relative to the stimuli directory, e.g. `human/human_L_03.tif`.
pub fn stimulus_tags(path: &Path) -> Result<(Species, GazeDirection, u32), CatalogError> {
    let stem = file_stem(path);
    let species = if path.to_string_lossy().to_lowercase().contains("human") {
        Species::Human
    } else {
        Species::Dog
    };
    let gaze = if stem.contains("_L") {
        GazeDirection::Left
    } else {
        GazeDirection::Right
    };
    let digits: String = stem.chars().filter(char::is_ascii_digit).collect();
    let number = digits
        .parse()
        .map_err(|_| CatalogError::Untagged(path.to_path_buf()))?;
    Ok((species, gaze, number))
}

/// Target files are tagged by an upper-case `L` anywhere in the stem; anything
/// else is a `T`.
pub fn target_letter(path: &Path) -> TargetLetter {
    if file_stem(path).contains('L') {
        TargetLetter::L
    } else {
        TargetLetter::T
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn tags_come_from_the_file_name() {
        let (species, gaze, number) = stimulus_tags(Path::new("stimuli/human/human_L_03.tif")).unwrap();
        assert_eq!(species, Species::Human);
        assert_eq!(gaze, GazeDirection::Left);
        assert_eq!(number, 3);

        let (species, gaze, number) = stimulus_tags(Path::new("stimuli/dog/dog_R_12.tif")).unwrap();
        assert_eq!(species, Species::Dog);
        assert_eq!(gaze, GazeDirection::Right);
        assert_eq!(number, 12);
    }

    #[test]
    fn stimulus_without_number_is_rejected() {
        assert!(matches!(
            stimulus_tags(Path::new("dog_L.tif")),
            Err(CatalogError::Untagged(_))
        ));
    }

    #[test]
    fn target_letter_from_stem() {
        assert_eq!(target_letter(Path::new("targets/L.tif")), TargetLetter::L);
        assert_eq!(target_letter(Path::new("targets/T.tif")), TargetLetter::T);
        assert_eq!(target_letter(Path::new("Letters/T.tif")), TargetLetter::T);
    }

    #[test]
    fn each_target_image_is_placed_on_both_sides() {
        let mut catalog = Catalog::new();
        let placed = catalog.add_target_letter(TargetLetter::T, "t-image");
        assert_eq!(placed[0].side, TargetSide::Left);
        assert_eq!(placed[1].side, TargetSide::Right);
        assert_eq!(placed[0].image, placed[1].image);
        assert_eq!(catalog.images()[placed[0].image.0], "t-image");
        assert_eq!(catalog.targets().len(), 2);
        assert_eq!(catalog.images().len(), 1);
    }

    #[test]
    fn loads_tagged_directories() {
        let dir = tempfile::tempdir().unwrap();
        let stimuli = dir.path().join("stimuli");
        let targets = dir.path().join("targets");
        fs::create_dir_all(stimuli.join("human")).unwrap();
        fs::create_dir_all(stimuli.join("dog")).unwrap();
        fs::create_dir_all(&targets).unwrap();
        for file in [
            stimuli.join("human/human_L_1.tif"),
            stimuli.join("human/human_R_1.tif"),
            stimuli.join("dog/dog_L_2.tif"),
            stimuli.join("notes.txt"),
            targets.join("L.tif"),
            targets.join("T.tif"),
        ] {
            fs::write(file, b"x").unwrap();
        }

        let mut seen = Vec::new();
        let catalog = Catalog::load(&stimuli, &targets, |path, kind| {
            seen.push(kind);
            Ok::<_, String>(path.file_name().unwrap().to_string_lossy().into_owned())
        })
        .unwrap();

        assert_eq!(catalog.stimuli().len(), 3);
        assert_eq!(catalog.targets().len(), 4);
        assert_eq!(catalog.images().len(), 5);
        assert_eq!(seen.iter().filter(|k| **k == AssetKind::Target).count(), 2);
        // sorted paths: dog before human
        assert_eq!(catalog.stimuli()[0].species, Species::Dog);
        let letters: Vec<_> = catalog.targets().iter().map(|t| t.letter).collect();
        assert_eq!(
            letters,
            vec![TargetLetter::L, TargetLetter::L, TargetLetter::T, TargetLetter::T]
        );
    }

    #[test]
    fn species_ignores_directories_above_the_stimuli_root() {
        let dir = tempfile::Builder::new()
            .prefix("HumanitiesLab")
            .tempdir()
            .unwrap();
        let stimuli = dir.path().join("stimuli");
        let targets = dir.path().join("targets");
        fs::create_dir_all(stimuli.join("dog")).unwrap();
        fs::create_dir_all(stimuli.join("Human")).unwrap();
        fs::create_dir_all(&targets).unwrap();
        fs::write(stimuli.join("dog/dog_L_1.tif"), b"x").unwrap();
        fs::write(stimuli.join("Human/face_R_2.tif"), b"x").unwrap();
        fs::write(targets.join("T.tif"), b"x").unwrap();

        let catalog = Catalog::load(&stimuli, &targets, |_, _| Ok::<_, String>(())).unwrap();
        let species: Vec<_> = catalog.stimuli().iter().map(|s| s.species).collect();
        assert_eq!(species, vec![Species::Human, Species::Dog]);
    }

    #[test]
    fn loader_failure_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("human_L_1.tif"), b"x").unwrap();
        let err = Catalog::<()>::load(dir.path(), dir.path(), |_, _| Err("corrupt")).unwrap_err();
        match err {
            CatalogError::Image { path, message } => {
                assert!(path.ends_with("human_L_1.tif"));
                assert_eq!(message, "corrupt");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn missing_directories_give_an_empty_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let catalog =
            Catalog::<()>::load(&dir.path().join("nope"), &dir.path().join("nada"), |_, _| {
                Ok::<_, String>(())
            })
            .unwrap();
        assert!(catalog.is_empty());
    }
}
