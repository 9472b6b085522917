use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use crate::config::AppConfig;
use crate::error::{LoadError, LoadResult};
use crate::http_client::{fetch_text, set_http_timeout};
use crate::images::{AssetProbe, ImageProbe, preload_images};
use crate::state::{Delta, LoaderCommand};

pub type SharedProbe = Arc<dyn ImageProbe + Send>;

pub fn is_remote(source: &str) -> bool {
    let lower = source.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Reads the raw dataset body from a path or an `http(s)://` URL.
pub fn fetch_dataset(source: &str) -> LoadResult<String> {
    if is_remote(source) {
        return fetch_text(source.trim());
    }
    let path = Path::new(source);
    fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })
}

pub fn spawn_loader(config: AppConfig, tx: Sender<Delta>, cmd_rx: Receiver<LoaderCommand>) {
    let probe: SharedProbe = Arc::new(AssetProbe::new(
        config.img_root.clone(),
        config.image_remote,
    ));
    spawn_loader_with_probe(config, probe, tx, cmd_rx);
}

/// Worker that owns all blocking I/O. Exits when either channel closes.
///
/// Each preload runs on its own thread so a `Load` is never queued behind
/// image probes. A newer `Load` or preload cancels the running one after its
/// current batch.
pub fn spawn_loader_with_probe(
    config: AppConfig,
    probe: SharedProbe,
    tx: Sender<Delta>,
    cmd_rx: Receiver<LoaderCommand>,
) {
    set_http_timeout(config.http_timeout_secs);
    thread::spawn(move || {
        let mut running: Option<Arc<AtomicBool>> = None;
        while let Ok(cmd) = cmd_rx.recv() {
            if let Some(cancel) = running.take() {
                cancel.store(true, Ordering::Relaxed);
            }
            let sent = match cmd {
                LoaderCommand::Load => load(&config.source, &tx),
                LoaderCommand::PreloadImages { generation, names } => {
                    let cancel = Arc::new(AtomicBool::new(false));
                    running = Some(Arc::clone(&cancel));
                    spawn_preload(
                        generation,
                        names,
                        Arc::clone(&probe),
                        config.preload_batch_size,
                        cancel,
                        tx.clone(),
                    );
                    true
                }
            };
            if !sent {
                break;
            }
        }
        if let Some(cancel) = running {
            cancel.store(true, Ordering::Relaxed);
        }
    });
}

fn spawn_preload(
    generation: u64,
    names: Vec<String>,
    probe: SharedProbe,
    batch_size: usize,
    cancel: Arc<AtomicBool>,
    tx: Sender<Delta>,
) {
    thread::spawn(move || {
        let summary = preload_images(&names, probe.as_ref(), batch_size, |batch| {
            if cancel.load(Ordering::Relaxed) {
                return false;
            }
            tx.send(Delta::ImagesResolved { generation, batch }).is_ok()
        });
        if !cancel.load(Ordering::Relaxed) {
            let _ = tx.send(Delta::PreloadFinished {
                generation,
                summary,
            });
        }
    });
}

fn load(source: &str, tx: &Sender<Delta>) -> bool {
    if tx
        .send(Delta::Log(format!("[INFO] Loading matchups from {source}")))
        .is_err()
    {
        return false;
    }
    let delta = match fetch_dataset(source) {
        Ok(body) => Delta::DatasetFetched {
            source: source.to_string(),
            body,
        },
        Err(err) => Delta::LoadFailed(err.to_string()),
    };
    tx.send(delta).is_ok()
}
