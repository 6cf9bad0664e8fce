use crate::cli::DirArgs;
use decision_match::config::PathsConfig;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn apply_dir_overrides(paths: &mut PathsConfig, dirs: &DirArgs) {
    if let Some(dir) = &dirs.data_dir {
        paths.data_dir = dir.clone();
    }
    if let Some(dir) = &dirs.models_dir {
        paths.models_dir = dir.clone();
    }
    if let Some(dir) = &dirs.docs_dir {
        paths.docs_dir = dir.clone();
    }
    if let Some(dir) = &dirs.configs_dir {
        paths.configs_dir = dir.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn only_given_directories_are_replaced() {
        let mut paths = PathsConfig::default();
        let dirs = DirArgs {
            models_dir: Some(PathBuf::from("/srv/models")),
            ..DirArgs::default()
        };
        apply_dir_overrides(&mut paths, &dirs);
        assert_eq!(paths.models_dir, PathBuf::from("/srv/models"));
        assert_eq!(paths.data_dir, PathBuf::from("data"));
    }
}
