use std::net::SocketAddr;
use std::sync::Arc;

use mesh_telemetry::{metric_inc, CHUNKS_DOWNLOADED, CHUNKS_SERVED, PACKETS_DROPPED};
use rm_01_peer_routing::{PeerRoutingApi, RoutedSend};
use shared_crypto::sha256;
use shared_types::{hash_to_hex, DataReply, DataRequest, Hash, DATA_HOP_LIMIT};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::FileService;
use crate::domain::{FileError, FileState, Result, SharedFile, SharedFileRef};
use crate::ports::check_file_name;

impl FileService {
    /// Download `metahash` from the peer named `from`, saving it as `name`.
    /// A stalled download of the same file resumes from `from` under its
    /// original name.
    pub fn download(
        self: &Arc<Self>,
        name: &str,
        metahash: Hash,
        from: &str,
    ) -> Result<JoinHandle<Result<()>>> {
        check_file_name(name)?;
        if let Some(file) = self.file(&metahash) {
            return self.resume_download(file, Some(from));
        }
        let file = self
            .index
            .write()
            .insert(SharedFile::mono_source(name, metahash, from))?;
        self.store.create_download(name)?;
        self.network
            .frontend()
            .push_constructing_file(name, &metahash, from);
        Ok(tokio::spawn(Arc::clone(self).run_download(file)))
    }

    /// Download a complete search match from the peers holding its chunks,
    /// saving it as `name`. A stalled match resumes under its original name.
    pub fn download_match(
        self: &Arc<Self>,
        metahash: Hash,
        name: &str,
    ) -> Result<JoinHandle<Result<()>>> {
        check_file_name(name)?;
        let file = self
            .file(&metahash)
            .ok_or_else(|| FileError::UnknownFile(hash_to_hex(&metahash)))?;
        let peer = {
            let mut guard = file.lock();
            if guard.is_stalled() {
                drop(guard);
                return self.resume_download(file, None);
            }
            if guard.state() != FileState::CompleteMatch {
                return Err(FileError::NotAvailable(hash_to_hex(&metahash)));
            }
            guard.begin_multi_source(name)
        };
        self.store.create_download(name)?;
        self.network
            .frontend()
            .push_constructing_file(name, &metahash, &peer);
        Ok(tokio::spawn(Arc::clone(self).run_download(file)))
    }

    fn resume_download(
        self: &Arc<Self>,
        file: SharedFileRef,
        source: Option<&str>,
    ) -> Result<JoinHandle<Result<()>>> {
        let (name, metahash, origin) = {
            let mut file = file.lock();
            if !file.resume(source.map(str::to_owned)) {
                return Err(FileError::AlreadyIndexed(hash_to_hex(&file.metahash())));
            }
            let origin = source
                .or(file.metafile_query_peer())
                .unwrap_or_default()
                .to_owned();
            (file.name().to_owned(), file.metahash(), origin)
        };
        info!("RESUMING download of {}", name);
        self.network
            .frontend()
            .push_constructing_file(&name, &metahash, &origin);
        Ok(tokio::spawn(Arc::clone(self).run_download(file)))
    }

    async fn run_download(self: Arc<Self>, file: SharedFileRef) -> Result<()> {
        let result = self.fetch_file(&file).await;
        if let Err(e) = &result {
            let (name, metahash, keep) = {
                let mut file = file.lock();
                let keep = file.abort_download();
                (file.name().to_owned(), file.metahash(), keep)
            };
            warn!("download of {} failed: {}", name, e);
            // nothing fetched yet, let the client try again
            if !keep {
                self.index.write().remove(&metahash);
            }
        }
        result
    }

    /// Metafile first, then chunks in order, one request at a time.
    async fn fetch_file(&self, file: &SharedFileRef) -> Result<()> {
        let (name, metahash, peer) = {
            let file = file.lock();
            (
                file.name().to_owned(),
                file.metahash(),
                file.metafile_query_peer().unwrap_or_default().to_owned(),
            )
        };

        let has_metafile = file.lock().metafile().is_some();
        if !has_metafile {
            info!("DOWNLOADING metafile of {} from {}", name, peer);
            let metafile = self.fetch(metahash, &peer).await?;
            file.lock().set_metafile(metafile)?;
            self.index.write().register_metafile(metahash);
        }

        loop {
            let step = {
                let file = file.lock();
                file.next_missing_chunk().map(|index| {
                    (
                        index,
                        file.chunk_hash(index),
                        file.chunk_source(index).map(str::to_owned),
                    )
                })
            };
            let Some((index, hash, source)) = step else {
                break;
            };
            let (Some(hash), Some(source)) = (hash, source) else {
                return Err(FileError::NoChunkSource { name, index });
            };

            info!("DOWNLOADING {} chunk {} from {}", name, index, source);
            let data = self.fetch(hash, &source).await?;
            self.store.write_chunk(&name, index, &data)?;
            metric_inc!(CHUNKS_DOWNLOADED);
            file.lock().record_chunk(index);
            self.index.write().register_chunk(metahash, hash, index);
        }

        info!("RECONSTRUCTED file {}", name);
        self.network
            .frontend()
            .push_reconstructed_file(&name, &metahash);
        Ok(())
    }

    /// Ask `from` for the bytes of `hash` and wait for a verified reply.
    async fn fetch(&self, hash: Hash, from: &str) -> Result<Vec<u8>> {
        let receiver = self.waiters.register(hash, from)?;
        let request = DataRequest {
            origin: self.network.name().to_string(),
            destination: from.to_owned(),
            hop_limit: DATA_HOP_LIMIT,
            hash_value: hash,
        };
        if let Err(e) = self.network.send_routed(request) {
            self.waiters.unregister(&hash);
            return Err(e.into());
        }
        let reply = tokio::time::timeout(self.settings.data_request_timeout, receiver).await;
        self.waiters.unregister(&hash);
        match reply {
            Ok(Ok(data)) => Ok(data),
            _ => Err(FileError::Timeout {
                hash: hash_to_hex(&hash),
                peer: from.to_owned(),
            }),
        }
    }

    /// A data request from `from`. Returns `true` when we answered it.
    pub fn on_data_request(&self, request: DataRequest, from: SocketAddr) -> bool {
        let name = self.network.name();
        if request.origin != name {
            self.network.learn_route(&request.origin, from);
        }
        if request.destination != name {
            let _ = self.network.send_routed(request);
            return false;
        }
        let Some(data) = self.serve(&request.hash_value) else {
            debug!(
                "no data for {} requested by {}",
                hash_to_hex(&request.hash_value),
                request.origin
            );
            metric_inc!(PACKETS_DROPPED, &["unknown_hash"]);
            return false;
        };
        let reply = DataReply {
            origin: name.to_string(),
            destination: request.origin,
            hop_limit: DATA_HOP_LIMIT,
            hash_value: request.hash_value,
            data,
        };
        match self.network.send_routed(reply) {
            Ok(_) => {
                metric_inc!(CHUNKS_SERVED);
                true
            }
            Err(_) => false,
        }
    }

    /// The metafile or chunk named by `hash`, if we hold it.
    fn serve(&self, hash: &Hash) -> Option<Vec<u8>> {
        let (file, index) = self.index.read().lookup(hash)?;
        let (name, location) = {
            let file = file.lock();
            if index == 0 {
                return file.metafile().map(<[u8]>::to_vec);
            }
            if !file.has_chunk(index) {
                return None;
            }
            (file.name().to_owned(), file.location())
        };
        match self.store.read_chunk(location, &name, index) {
            Ok(chunk) => Some(chunk),
            Err(e) => {
                warn!("cannot serve chunk {} of {}: {}", index, name, e);
                None
            }
        }
    }

    /// A data reply from `from`. Returns `true` when it completed one of our
    /// requests.
    pub fn on_data_reply(&self, reply: DataReply, from: SocketAddr) -> bool {
        let name = self.network.name();
        if reply.origin != name {
            self.network.learn_route(&reply.origin, from);
        }
        if reply.destination != name {
            let _ = self.network.send_routed(reply);
            return false;
        }
        if sha256(&reply.data) != reply.hash_value {
            debug!(
                "data reply from {} does not hash to {}",
                reply.origin,
                hash_to_hex(&reply.hash_value)
            );
            metric_inc!(PACKETS_DROPPED, &["bad_hash"]);
            return false;
        }
        self.waiters
            .deliver(&reply.hash_value, &reply.origin, reply.data)
    }

    /// The chain gave `metahash`'s name to another file.
    pub fn invalidate(&self, metahash: &Hash) -> bool {
        let Some(file) = self.file(metahash) else {
            return false;
        };
        let (changed, name) = {
            let mut file = file.lock();
            (file.invalidate(), file.name().to_owned())
        };
        if changed {
            info!("INVALIDATED file {} metahash {}", name, hash_to_hex(metahash));
            self.network.frontend().push_invalidated_file(&name, metahash);
        }
        changed
    }
}
