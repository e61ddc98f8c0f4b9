use std::io::{Cursor, Read};

use zip::ZipArchive;

use crate::rom::error::{RomError, RomResult};
use crate::rom::events::Stabilization;

pub const B_MAT: &str = "B_mat.txt";
pub const K_MAT: &str = "K_mat.txt";
pub const P_MAT: &str = "P_mat.txt";
pub const D_MAT: &str = "D_mat.txt";
pub const BC3_MAT: &str = "BC3_mat.txt";
pub const MODES_MAT: &str = "EigenModes_U_mat.txt";
pub const PAR_FILE: &str = "par.txt";
pub const MU_MAT: &str = "mu_mat.txt";
pub const COEFF_L2_MAT: &str = "coeffL2_mat.txt";
pub const GRID_FILE: &str = "internal.vtu";

pub fn ct1_name(i: usize) -> String {
    format!("ct1_{i}_mat.txt")
}

pub fn ct2_name(i: usize) -> String {
    format!("ct2_{i}_mat.txt")
}

pub fn c_name(i: usize) -> String {
    format!("C{i}_mat.txt")
}

pub fn g_name(i: usize) -> String {
    format!("G{i}_mat.txt")
}

pub fn weights_name(i: usize) -> String {
    format!("wRBF_{i}_mat.txt")
}

/// A fetched dataset archive. Owns the raw zip bytes until decode is done;
/// the whole thing is dropped once the pipeline has emitted its events.
pub struct DatasetArchive {
    zip: ZipArchive<Cursor<Vec<u8>>>,
    names: Vec<String>,
}

/// What the archive claims to contain, derived purely from the name listing
/// before any heavyweight decode. Index families must be contiguous from 0;
/// a hole means the offline stage was interrupted and the dataset is
/// unusable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveManifest {
    /// Number of `ct1_<i>` entries (= velocity mode count).
    pub n_ct: usize,
    /// Number of `G<i>` entries (= pressure mode count for PPE cases).
    pub n_g: usize,
    /// Number of `wRBF_<i>` entries (= turbulence mode count, 0 if laminar).
    pub n_weights: usize,
    /// Name of the optional surface mesh, present for 3-D cases.
    pub surface: Option<String>,
}

impl DatasetArchive {
    pub fn open(bytes: Vec<u8>) -> RomResult<Self> {
        let zip = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| RomError::decode("archive", e.to_string()))?;
        let names = zip.file_names().map(str::to_string).collect();
        Ok(DatasetArchive { zip, names })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn read_text(&mut self, name: &str) -> RomResult<String> {
        let mut file = self.zip.by_name(name).map_err(|_| RomError::MissingArtifact {
            file: name.to_string(),
        })?;
        let mut text = String::new();
        file.read_to_string(&mut text)
            .map_err(|e| RomError::decode(name, e.to_string()))?;
        Ok(text)
    }

    pub fn read_bytes(&mut self, name: &str) -> RomResult<Vec<u8>> {
        let mut file = self.zip.by_name(name).map_err(|_| RomError::MissingArtifact {
            file: name.to_string(),
        })?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|e| RomError::decode(name, e.to_string()))?;
        Ok(bytes)
    }

    /// Scan the name listing and verify that every file the stabilization
    /// variant mandates is present. This is the explicit check the legacy
    /// pipeline lacked: a hole here used to show up as a progress bar stuck
    /// below 100%.
    pub fn scan(&self, stabilization: Stabilization) -> RomResult<ArchiveManifest> {
        for required in [B_MAT, K_MAT, MODES_MAT, PAR_FILE, GRID_FILE] {
            self.require(required)?;
        }
        match stabilization {
            Stabilization::Supremizer => self.require(P_MAT)?,
            Stabilization::Ppe => {
                self.require(D_MAT)?;
                self.require(BC3_MAT)?;
            }
        }

        let n_ct = self.contiguous_count(ct1_name)?;
        if n_ct == 0 {
            return Err(RomError::MissingArtifact {
                file: ct1_name(0),
            });
        }
        // ct2 and C must pair up with ct1, index for index.
        for i in 0..n_ct {
            self.require(&ct2_name(i))?;
            self.require(&c_name(i))?;
        }

        let n_g = match stabilization {
            Stabilization::Ppe => {
                let n = self.contiguous_count(g_name)?;
                if n == 0 {
                    return Err(RomError::MissingArtifact { file: g_name(0) });
                }
                n
            }
            Stabilization::Supremizer => 0,
        };

        let n_weights = self.contiguous_count(weights_name)?;
        if n_weights > 0 {
            self.require(MU_MAT)?;
            self.require(COEFF_L2_MAT)?;
        }

        let surface = self
            .names
            .iter()
            .find(|n| n.ends_with(".vtp"))
            .cloned();

        Ok(ArchiveManifest {
            n_ct,
            n_g,
            n_weights,
            surface,
        })
    }

    fn require(&self, name: &str) -> RomResult<()> {
        if self.contains(name) {
            Ok(())
        } else {
            Err(RomError::MissingArtifact {
                file: name.to_string(),
            })
        }
    }

    /// Count an indexed family, requiring indices 0..n with no holes.
    /// A family member above a hole means an interrupted export.
    fn contiguous_count(&self, name_for: fn(usize) -> String) -> RomResult<usize> {
        let total = (0..self.names.len())
            .filter(|&i| self.contains(&name_for(i)))
            .count();
        let mut run = 0usize;
        while self.contains(&name_for(run)) {
            run += 1;
        }
        if run != total {
            return Err(RomError::MissingArtifact {
                file: name_for(run),
            });
        }
        Ok(run)
    }
}

#[cfg(test)]
pub(crate) mod test_archive {
    use std::io::{Cursor, Write};

    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    /// Build an in-memory zip from (name, content) pairs.
    pub fn build(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, content) in entries {
            writer.start_file(name.to_string(), options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::test_archive::build;
    use super::*;

    fn minimal_entries() -> Vec<(&'static str, &'static str)> {
        vec![
            (B_MAT, "1 0\n0 1\n"),
            (K_MAT, "2 0\n0 2\n"),
            (P_MAT, "1 1\n"),
            (MODES_MAT, "1 0 0\n0 1 0\n"),
            (PAR_FILE, "0.5\n"),
            (GRID_FILE, "<vtu/>"),
            ("ct1_0_mat.txt", "1\n"),
            ("ct2_0_mat.txt", "1\n"),
            ("C0_mat.txt", "1\n"),
            ("ct1_1_mat.txt", "1\n"),
            ("ct2_1_mat.txt", "1\n"),
            ("C1_mat.txt", "1\n"),
        ]
    }

    #[test]
    fn test_scan_supremizer_ok() {
        let archive = DatasetArchive::open(build(&minimal_entries())).unwrap();
        let manifest = archive.scan(Stabilization::Supremizer).unwrap();
        assert_eq!(manifest.n_ct, 2);
        assert_eq!(manifest.n_g, 0);
        assert_eq!(manifest.n_weights, 0);
        assert!(manifest.surface.is_none());
    }

    #[test]
    fn test_scan_detects_missing_core_matrix() {
        let entries: Vec<_> = minimal_entries()
            .into_iter()
            .filter(|(name, _)| *name != K_MAT)
            .collect();
        let archive = DatasetArchive::open(build(&entries)).unwrap();
        let err = archive.scan(Stabilization::Supremizer).unwrap_err();
        assert_eq!(
            err,
            RomError::MissingArtifact {
                file: K_MAT.to_string()
            }
        );
    }

    #[test]
    fn test_scan_detects_unpaired_index_family() {
        let entries: Vec<_> = minimal_entries()
            .into_iter()
            .filter(|(name, _)| *name != "ct2_1_mat.txt")
            .collect();
        let archive = DatasetArchive::open(build(&entries)).unwrap();
        let err = archive.scan(Stabilization::Supremizer).unwrap_err();
        assert_eq!(
            err,
            RomError::MissingArtifact {
                file: "ct2_1_mat.txt".to_string()
            }
        );
    }

    #[test]
    fn test_scan_ppe_requires_gradient_family() {
        let mut entries = minimal_entries();
        entries.retain(|(name, _)| *name != P_MAT);
        entries.push((D_MAT, "1\n"));
        entries.push((BC3_MAT, "1\n"));
        let archive = DatasetArchive::open(build(&entries)).unwrap();
        let err = archive.scan(Stabilization::Ppe).unwrap_err();
        assert_eq!(err, RomError::MissingArtifact { file: g_name(0) });
    }

    #[test]
    fn test_scan_finds_surface_mesh() {
        let mut entries = minimal_entries();
        entries.push(("wall.vtp", "<vtp/>"));
        let archive = DatasetArchive::open(build(&entries)).unwrap();
        let manifest = archive.scan(Stabilization::Supremizer).unwrap();
        assert_eq!(manifest.surface.as_deref(), Some("wall.vtp"));
    }

    #[test]
    fn test_read_missing_file_is_explicit() {
        let mut archive = DatasetArchive::open(build(&minimal_entries())).unwrap();
        let err = archive.read_text("nope.txt").unwrap_err();
        assert!(matches!(err, RomError::MissingArtifact { .. }));
    }

    #[test]
    fn test_turbulent_set_requires_regression_inputs() {
        let mut entries = minimal_entries();
        entries.push(("wRBF_0_mat.txt", "1\n"));
        let archive = DatasetArchive::open(build(&entries)).unwrap();
        let err = archive.scan(Stabilization::Supremizer).unwrap_err();
        assert_eq!(
            err,
            RomError::MissingArtifact {
                file: MU_MAT.to_string()
            }
        );
    }
}
