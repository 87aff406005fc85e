use crate::domain::{Clustering, KMeansError};
use ndarray::ArrayView2;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

pub const CENTROIDS_FILE: &str = "cluster_centres.csv";
pub const MEMBERSHIP_FILE: &str = "membership.csv";

/// Files produced by [`write_results`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub centroids: PathBuf,
    pub membership: PathBuf,
}

/// Writes `cluster_centres.csv` and `membership.csv` into `dir`.
pub fn write_results(
    dir: impl AsRef<Path>,
    clustering: &Clustering,
) -> Result<OutputPaths, KMeansError> {
    let dir = dir.as_ref();
    let paths = OutputPaths {
        centroids: dir.join(CENTROIDS_FILE),
        membership: dir.join(MEMBERSHIP_FILE),
    };

    write_file(&paths.centroids, |w| write_centroids(w, clustering.centroids.view()))?;
    write_file(&paths.membership, |w| write_membership(w, &clustering.membership))?;

    info!(
        centroids = %paths.centroids.display(),
        membership = %paths.membership.display(),
        "results written"
    );
    Ok(paths)
}

fn write_file<F>(path: &Path, body: F) -> Result<(), KMeansError>
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    let file = File::create(path).map_err(|e| KMeansError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    body(&mut writer)
        .and_then(|()| writer.flush())
        .map_err(|e| KMeansError::io(path, e))
}

/// One line per cluster: the cluster index, then its coordinates.
pub fn write_centroids<W: Write>(w: &mut W, centroids: ArrayView2<'_, f32>) -> std::io::Result<()> {
    for (cluster, centroid) in centroids.outer_iter().enumerate() {
        write!(w, "{cluster}")?;
        for value in centroid {
            write!(w, " {value:.6}")?;
        }
        writeln!(w)?;
    }
    Ok(())
}

/// One cluster index per line, in object order.
pub fn write_membership<W: Write>(w: &mut W, membership: &[usize]) -> std::io::Result<()> {
    for cluster in membership {
        writeln!(w, "{cluster}")?;
    }
    Ok(())
}
