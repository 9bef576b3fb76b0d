use agscope_core::{ProjectResolver, resolve_data_dir};
use agscope_engine::RenderOptions;
use agscope_providers::{DecodeContext, decoder_for};
use agscope_types::{Filters, Session, SessionId, Source};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::aggregator::UnifiedIndex;
use crate::cache::TranscriptCache;
use crate::config::Config;
use crate::report::CorpusReport;
use crate::search::{SearchCoordinator, SearchHandle};
use crate::store::SessionStore;
use crate::{Error, Result};

/// Entry point tying config, stores, cache and search together
pub struct Workspace {
    data_dir: PathBuf,
    config: Config,
    cache: Arc<TranscriptCache>,
    index: Arc<UnifiedIndex>,
    coordinator: SearchCoordinator,
}

impl Workspace {
    /// Load `config.toml` from the data directory (detected defaults when it
    /// is missing) and index every enabled source
    pub fn open(data_dir: Option<&str>) -> Result<Self> {
        let data_dir = resolve_data_dir(data_dir)?;
        let config_path = Config::path_in(&data_dir);
        let config = if config_path.exists() {
            Config::load_from(&config_path)?
        } else {
            tracing::debug!(path = ?config_path, "no config file, detecting sources");
            Config::detect_sources()
        };
        Ok(Self::load(data_dir, config))
    }

    pub fn load(data_dir: PathBuf, config: Config) -> Self {
        let cache = Arc::new(TranscriptCache::new(config.cache_ttl()));
        let context = DecodeContext::new(Arc::new(ProjectResolver::empty()), config.decode_limits());

        let stores = config
            .enabled_sources()
            .into_iter()
            .map(|(source, root)| {
                Arc::new(SessionStore::new(
                    decoder_for(source),
                    root,
                    context.clone(),
                    Some(Arc::clone(&cache)),
                ))
            })
            .collect();
        let index = Arc::new(UnifiedIndex::new(stores));
        let coordinator =
            SearchCoordinator::new(Arc::clone(&index), Arc::clone(&cache), config.search.clone());

        let workspace = Self {
            data_dir,
            config,
            cache,
            index,
            coordinator,
        };
        workspace.reindex();
        workspace
    }

    /// Rebuild every store from the filesystem.
    ///
    /// Sources that record their working directory are indexed first; those
    /// directories (plus configured project roots) then seed the resolver
    /// used for sources that only record a project hash.
    pub fn reindex(&self) -> CorpusReport {
        let mut seed = ProjectResolver::builder();
        seed.register_all(self.config.project_roots.iter().map(PathBuf::as_path));
        let first_pass = Arc::new(seed.build());

        let (hash_keyed, cwd_bearing): (Vec<_>, Vec<_>) = self
            .index
            .stores()
            .iter()
            .partition(|store| store.source() == Source::Gemini);

        for store in &cwd_bearing {
            store.set_resolver(Arc::clone(&first_pass));
            store.index();
        }

        let mut builder = ProjectResolver::builder();
        builder.register_all(self.config.project_roots.iter().map(PathBuf::as_path));
        let cwds: Vec<PathBuf> = cwd_bearing
            .iter()
            .flat_map(|store| store.all())
            .filter_map(|session| session.cwd.as_ref().map(PathBuf::from))
            .collect();
        builder.register_all(cwds.iter().map(PathBuf::as_path));
        let resolver = Arc::new(builder.build());

        for store in self.index.stores() {
            store.set_resolver(Arc::clone(&resolver));
        }
        for store in &hash_keyed {
            store.index();
        }

        let report = self.index.report();
        tracing::info!(
            sessions = self.index.len(),
            not_indexable = report.not_indexable(),
            unreadable = report.unreadable(),
            resolver_keys = resolver.len(),
            "workspace indexed"
        );
        report
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn index(&self) -> &Arc<UnifiedIndex> {
        &self.index
    }

    pub fn cache(&self) -> &Arc<TranscriptCache> {
        &self.cache
    }

    pub fn report(&self) -> CorpusReport {
        self.index.report()
    }

    /// `NoSessionsFound` when every enabled source is empty or inaccessible
    pub fn ensure_sessions(&self) -> Result<()> {
        if self.index.is_empty() {
            return Err(Error::NoSessionsFound);
        }
        Ok(())
    }

    pub fn sessions(&self) -> Vec<Arc<Session>> {
        self.index.all()
    }

    pub fn find(&self, id_prefix: &str) -> Result<Arc<Session>> {
        self.index.find_by_prefix(id_prefix)
    }

    /// Full parse outside of search, persisted in the owning store
    pub fn reload(&self, id: &SessionId) -> Result<Arc<Session>> {
        self.index.reload(id)
    }

    pub fn transcript(&self, session: &Session, options: &RenderOptions) -> Arc<str> {
        self.cache.get_or_render(session, options)
    }

    pub fn start_search(&self, filters: Filters) -> Result<SearchHandle> {
        self.cache.sweep();
        self.coordinator.start(filters)
    }

    pub fn start_search_prioritized(&self, filters: Filters, id: SessionId) -> Result<SearchHandle> {
        self.cache.sweep();
        self.coordinator.start_prioritized(filters, id)
    }

    pub fn cancel_search(&self) {
        self.coordinator.cancel();
    }

    pub fn promote(&self, id: SessionId) -> bool {
        self.coordinator.promote(id)
    }
}
