use crate::errors::Result;
use crate::metrics;
use crate::upstream::{LedgerClient, UpstreamReply};
use ledger_service::validation;

/// Shape-checks submissions and passes them to the ledger service.
///
/// Holds no ledger state; every invariant beyond the range check is decided
/// upstream.
pub struct IncrementRelay {
    upstream: LedgerClient,
    n_max: i64,
}

impl IncrementRelay {
    pub fn new(upstream: LedgerClient, n_max: i64) -> Self {
        IncrementRelay { upstream, n_max }
    }

    pub fn upstream(&self) -> &LedgerClient {
        &self.upstream
    }

    pub async fn increment(&self, body: &[u8]) -> Result<UpstreamReply> {
        let n = validation::parse_body(body, self.n_max)?;

        match self.upstream.process(n).await {
            Ok(reply) => {
                let status = reply.status.to_string();
                metrics::FORWARD_REQUESTS_TOTAL
                    .with_label_values(&[status.as_str()])
                    .inc();
                Ok(reply)
            }
            Err(e) => {
                metrics::FORWARD_REQUESTS_TOTAL
                    .with_label_values(&[e.error_code()])
                    .inc();
                Err(e)
            }
        }
    }
}
