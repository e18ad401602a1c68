//! Call options and their fold into a per-call configuration.

use std::fmt;
use std::sync::Arc;

use crate::interceptor::{Chain, Interceptor};

/// One configuration knob, set on the client or on a single call.
#[derive(Clone)]
pub enum CallOption {
    /// Gzip-compress request bodies.
    GzipRequests(bool),
    /// Bound on the decoded response message size. `0` means unbounded.
    ReadMaxBytes(usize),
    /// Wrap the network call in an interceptor.
    Interceptor(Arc<dyn Interceptor>),
}

impl CallOption {
    pub fn interceptor(interceptor: impl Interceptor + 'static) -> Self {
        CallOption::Interceptor(Arc::new(interceptor))
    }
}

impl From<Chain> for CallOption {
    fn from(chain: Chain) -> Self {
        CallOption::Interceptor(Arc::new(chain))
    }
}

impl fmt::Debug for CallOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallOption::GzipRequests(on) => f.debug_tuple("GzipRequests").field(on).finish(),
            CallOption::ReadMaxBytes(max) => f.debug_tuple("ReadMaxBytes").field(max).finish(),
            CallOption::Interceptor(_) => f.write_str("Interceptor(..)"),
        }
    }
}

/// Settings for one call, fixed once the call starts.
#[derive(Clone, Default)]
pub struct CallConfig {
    pub gzip_requests: bool,
    pub max_response_bytes: usize,
    pub interceptor: Option<Arc<dyn Interceptor>>,
}

impl CallConfig {
    /// Apply `options` in order. Scalar settings are last-write-wins;
    /// interceptors accumulate, earliest outermost.
    pub fn fold<'a>(options: impl IntoIterator<Item = &'a CallOption>) -> Self {
        let mut config = CallConfig::default();
        let mut interceptors: Vec<Arc<dyn Interceptor>> = Vec::new();
        for option in options {
            match option {
                CallOption::GzipRequests(on) => config.gzip_requests = *on,
                CallOption::ReadMaxBytes(max) => config.max_response_bytes = *max,
                CallOption::Interceptor(interceptor) => interceptors.push(interceptor.clone()),
            }
        }
        config.interceptor = match interceptors.len() {
            0 => None,
            1 => interceptors.pop(),
            _ => Some(Arc::new(Chain::from(interceptors))),
        };
        config
    }
}

impl fmt::Debug for CallConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallConfig")
            .field("gzip_requests", &self.gzip_requests)
            .field("max_response_bytes", &self.max_response_bytes)
            .field("interceptor", &self.interceptor.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interceptor::UnaryCall;

    struct Passthrough;

    impl Interceptor for Passthrough {
        fn wrap(&self, next: Arc<dyn UnaryCall>) -> Arc<dyn UnaryCall> {
            next
        }
    }

    #[test]
    fn defaults() {
        let config = CallConfig::fold(std::iter::empty());
        assert!(!config.gzip_requests);
        assert_eq!(config.max_response_bytes, 0);
        assert!(config.interceptor.is_none());
    }

    #[test]
    fn scalars_last_write_wins() {
        let client = [CallOption::GzipRequests(true), CallOption::ReadMaxBytes(10)];
        let call = [CallOption::ReadMaxBytes(20), CallOption::GzipRequests(false)];
        let config = CallConfig::fold(client.iter().chain(call.iter()));
        assert!(!config.gzip_requests);
        assert_eq!(config.max_response_bytes, 20);
    }

    #[test]
    fn single_interceptor_kept_as_is() {
        let interceptor: Arc<dyn Interceptor> = Arc::new(Passthrough);
        let options = [CallOption::Interceptor(interceptor.clone())];
        let config = CallConfig::fold(&options);
        let folded = config.interceptor.unwrap();
        assert!(Arc::ptr_eq(&folded, &interceptor));
    }

    #[test]
    fn interceptors_accumulate() {
        let options = [
            CallOption::interceptor(Passthrough),
            CallOption::GzipRequests(true),
            CallOption::from(Chain::new().with(Passthrough)),
        ];
        let config = CallConfig::fold(&options);
        assert!(config.gzip_requests);
        assert!(config.interceptor.is_some());
        assert_eq!(format!("{:?}", options[0]), "Interceptor(..)");
    }
}
