use futures::channel::mpsc::UnboundedSender;
use futures::stream::{FuturesUnordered, StreamExt};

use crate::rom::archive::{self, DatasetArchive};
use crate::rom::error::RomResult;
use crate::rom::events::{
    BasisCounts, CoreMatrices, Coupling, Phase, PipelineEvent, Stabilization,
};
use crate::rom::matrix::Matrix;

/// Which per-index family an extracted text belongs to.
#[derive(Debug, Clone, Copy)]
enum Family {
    Ct1,
    Ct2,
    C,
    G,
    Weights,
}

impl Family {
    fn event(self, index: usize, matrix: Matrix) -> PipelineEvent {
        match self {
            Family::Ct1 => PipelineEvent::Ct1 { index, matrix },
            Family::Ct2 => PipelineEvent::Ct2 { index, matrix },
            Family::C => PipelineEvent::C { index, matrix },
            Family::G => PipelineEvent::G { index, matrix },
            Family::Weights => PipelineEvent::Weights { index, matrix },
        }
    }
}

/// Decode a fetched dataset archive, streaming typed events to the UI side.
///
/// Always terminates the stream with exactly one `Initialized` or `Failed`
/// event; the channel is the only side effect. Runs as a spawned task so the
/// render loop never blocks on decode work.
pub async fn run(bytes: Vec<u8>, stabilization: Stabilization, tx: UnboundedSender<PipelineEvent>) {
    match run_inner(bytes, stabilization, &tx).await {
        Ok(()) => {
            let _ = tx.unbounded_send(PipelineEvent::Initialized);
        }
        Err(err) => {
            let _ = tx.unbounded_send(PipelineEvent::Failed(err));
        }
    }
}

async fn run_inner(
    bytes: Vec<u8>,
    stabilization: Stabilization,
    tx: &UnboundedSender<PipelineEvent>,
) -> RomResult<()> {
    let mut archive = DatasetArchive::open(bytes)?;
    let manifest = archive.scan(stabilization)?;

    // Everything the decode phase will touch, for progress accounting.
    let coupling_files = match stabilization {
        Stabilization::Supremizer => 1,
        Stabilization::Ppe => 2,
    };
    let rbf_files = if manifest.n_weights > 0 { 2 } else { 0 };
    let total = coupling_files
        + 2 // K, B
        + 3 // par, grid, modes
        + manifest.surface.iter().len()
        + 3 * manifest.n_ct
        + manifest.n_g
        + manifest.n_weights
        + rbf_files;
    let mut done = 0usize;
    let progress = |done: usize| {
        let percent = (done * 100 / total) as u8;
        let _ = tx.unbounded_send(PipelineEvent::Progress {
            phase: Phase::Decode,
            percent,
        });
    };

    let decode = |archive: &mut DatasetArchive, name: &str| -> RomResult<Matrix> {
        let text = archive.read_text(name)?;
        Matrix::parse(&text, name)
    };

    // Small header matrices first: they fix the basis counts the receiver
    // needs before it can route anything else.
    let par = decode(&mut archive, archive::PAR_FILE)?;
    done += 1;
    progress(done);

    let coupling = match stabilization {
        Stabilization::Supremizer => Coupling::Supremizer {
            p: decode(&mut archive, archive::P_MAT)?,
        },
        Stabilization::Ppe => Coupling::Ppe {
            d: decode(&mut archive, archive::D_MAT)?,
            bc3: decode(&mut archive, archive::BC3_MAT)?,
        },
    };
    done += coupling_files;
    progress(done);

    let k = decode(&mut archive, archive::K_MAT)?;
    let b = decode(&mut archive, archive::B_MAT)?;
    done += 2;
    progress(done);

    let counts = BasisCounts {
        n_phi_u: manifest.n_ct,
        n_phi_p: match (&coupling, stabilization) {
            (Coupling::Supremizer { p }, _) => p.rows(),
            (_, Stabilization::Ppe) => manifest.n_g,
            _ => 0,
        },
        n_phi_nut: manifest.n_weights,
        n_runs: par.rows(),
    };
    let _ = tx.unbounded_send(PipelineEvent::Constructor(counts));

    let grid = archive.read_bytes(archive::GRID_FILE)?;
    done += 1;
    progress(done);
    let _ = tx.unbounded_send(PipelineEvent::Grid(grid));

    let _ = tx.unbounded_send(PipelineEvent::Matrices(CoreMatrices { coupling, k, b }));

    // Per-index files: extraction is sequential (the zip reader is one
    // cursor), parsing fans out. Completion order is whatever the executor
    // produces; the receiver routes by the explicit index.
    let mut jobs = Vec::new();
    for i in 0..manifest.n_ct {
        jobs.push((Family::Ct1, i, archive::ct1_name(i)));
        jobs.push((Family::Ct2, i, archive::ct2_name(i)));
        jobs.push((Family::C, i, archive::c_name(i)));
    }
    for i in 0..manifest.n_g {
        jobs.push((Family::G, i, archive::g_name(i)));
    }
    for i in 0..manifest.n_weights {
        jobs.push((Family::Weights, i, archive::weights_name(i)));
    }

    let mut extracted = Vec::with_capacity(jobs.len());
    for (family, index, name) in jobs {
        extracted.push((family, index, name.clone(), archive.read_text(&name)?));
    }

    let mut parses: FuturesUnordered<_> = extracted
        .into_iter()
        .map(|(family, index, name, text)| async move {
            Matrix::parse(&text, &name).map(|m| family.event(index, m))
        })
        .collect();
    while let Some(result) = parses.next().await {
        let _ = tx.unbounded_send(result?);
        done += 1;
        progress(done);
    }

    if manifest.n_weights > 0 {
        let mu = decode(&mut archive, archive::MU_MAT)?;
        let coeff_l2 = decode(&mut archive, archive::COEFF_L2_MAT)?;
        done += 2;
        progress(done);
        let _ = tx.unbounded_send(PipelineEvent::Rbf { mu, coeff_l2 });
    }

    let modes = decode(&mut archive, archive::MODES_MAT)?;
    done += 1;
    progress(done);
    let _ = tx.unbounded_send(PipelineEvent::Modes(modes));

    if let Some(name) = &manifest.surface {
        let surface = archive.read_bytes(name)?;
        done += 1;
        progress(done);
        let _ = tx.unbounded_send(PipelineEvent::Surface(surface));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use futures::channel::mpsc;
    use futures::executor::block_on;

    use super::*;
    use crate::rom::archive::test_archive::build;
    use crate::rom::error::RomError;

    fn collect_events(
        entries: &[(&str, &str)],
        stabilization: Stabilization,
    ) -> Vec<PipelineEvent> {
        let (tx, rx) = mpsc::unbounded();
        block_on(async move {
            // `run` drops the sender when it returns, closing the stream.
            run(build(entries), stabilization, tx).await;
            rx.collect().await
        })
    }

    fn valid_entries() -> Vec<(&'static str, &'static str)> {
        vec![
            ("B_mat.txt", "1 0\n0 1\n"),
            ("K_mat.txt", "2 0\n0 2\n"),
            ("P_mat.txt", "1 1\n"),
            ("EigenModes_U_mat.txt", "1 0\n0 1\n"),
            ("par.txt", "0.5\n1.5\n"),
            ("internal.vtu", "<vtu/>"),
            ("ct1_0_mat.txt", "1\n"),
            ("ct2_0_mat.txt", "2\n"),
            ("C0_mat.txt", "3\n"),
            ("ct1_1_mat.txt", "4\n"),
            ("ct2_1_mat.txt", "5\n"),
            ("C1_mat.txt", "6\n"),
        ]
    }

    #[test]
    fn test_constructor_precedes_data_and_initialized_is_last() {
        let events = collect_events(&valid_entries(), Stabilization::Supremizer);
        let constructor_at = events
            .iter()
            .position(|e| matches!(e, PipelineEvent::Constructor(_)))
            .expect("constructor emitted");
        for (i, event) in events.iter().enumerate() {
            match event {
                PipelineEvent::Progress { .. } | PipelineEvent::Constructor(_) => {}
                PipelineEvent::Initialized => {
                    assert_eq!(i, events.len() - 1, "initialized must be last");
                }
                _ => assert!(i > constructor_at, "data event {event:?} before constructor"),
            }
        }
        assert!(matches!(events.last(), Some(PipelineEvent::Initialized)));
    }

    #[test]
    fn test_counts_derived_from_archive() {
        let events = collect_events(&valid_entries(), Stabilization::Supremizer);
        let counts = events
            .iter()
            .find_map(|e| match e {
                PipelineEvent::Constructor(c) => Some(*c),
                _ => None,
            })
            .unwrap();
        assert_eq!(counts.n_phi_u, 2);
        assert_eq!(counts.n_phi_p, 1); // rows of P_mat
        assert_eq!(counts.n_phi_nut, 0);
        assert_eq!(counts.n_runs, 2);
    }

    #[test]
    fn test_progress_is_monotone_and_reaches_100() {
        let events = collect_events(&valid_entries(), Stabilization::Supremizer);
        let mut last = 0u8;
        for event in &events {
            if let PipelineEvent::Progress { percent, .. } = event {
                assert!(*percent >= last, "progress went backwards: {last} -> {percent}");
                last = *percent;
            }
        }
        assert_eq!(last, 100);
    }

    #[test]
    fn test_malformed_matrix_fails_terminally() {
        let mut entries = valid_entries();
        entries[6] = ("ct1_0_mat.txt", "1 garbage\n");
        let events = collect_events(&entries, Stabilization::Supremizer);
        match events.last() {
            Some(PipelineEvent::Failed(RomError::Decode { file, .. })) => {
                assert_eq!(file, "ct1_0_mat.txt");
            }
            other => panic!("expected terminal Failed, got {other:?}"),
        }
        assert!(
            !events.iter().any(|e| matches!(e, PipelineEvent::Initialized)),
            "failed pipeline must never initialize"
        );
    }

    #[test]
    fn test_missing_mandatory_file_fails_before_any_data() {
        let entries: Vec<_> = valid_entries()
            .into_iter()
            .filter(|(name, _)| *name != "internal.vtu")
            .collect();
        let events = collect_events(&entries, Stabilization::Supremizer);
        assert!(matches!(
            events.last(),
            Some(PipelineEvent::Failed(RomError::MissingArtifact { .. }))
        ));
        assert!(!events.iter().any(|e| matches!(e, PipelineEvent::Grid(_))));
    }

    #[test]
    fn test_surface_mesh_forwarded_for_3d_cases() {
        let mut entries = valid_entries();
        entries.push(("boundary.vtp", "<vtp/>"));
        let events = collect_events(&entries, Stabilization::Supremizer);
        assert!(events
            .iter()
            .any(|e| matches!(e, PipelineEvent::Surface(bytes) if bytes == b"<vtp/>")));
    }

    #[test]
    fn test_every_index_delivered_once_per_family() {
        let events = collect_events(&valid_entries(), Stabilization::Supremizer);
        for want in 0..2usize {
            let ct1 = events
                .iter()
                .filter(|e| matches!(e, PipelineEvent::Ct1 { index, .. } if *index == want))
                .count();
            let ct2 = events
                .iter()
                .filter(|e| matches!(e, PipelineEvent::Ct2 { index, .. } if *index == want))
                .count();
            let c = events
                .iter()
                .filter(|e| matches!(e, PipelineEvent::C { index, .. } if *index == want))
                .count();
            assert_eq!((ct1, ct2, c), (1, 1, 1), "index {want} not delivered exactly once");
        }
    }
}
