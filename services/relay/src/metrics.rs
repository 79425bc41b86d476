use lazy_static::lazy_static;
use prometheus::{IntCounterVec, Opts, Registry};

lazy_static! {
    // Labelled with the upstream status code, or the error name on transport failure
    pub static ref FORWARD_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("relay_forward_requests_total", "Requests forwarded to the ledger service"),
        &["status"]
    ).expect("metric can be created");
}

pub fn register_metrics(registry: &Registry) -> Result<(), prometheus::Error> {
    registry.register(Box::new(FORWARD_REQUESTS_TOTAL.clone()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        let registry = Registry::new();
        assert!(register_metrics(&registry).is_ok());

        FORWARD_REQUESTS_TOTAL.with_label_values(&["200"]).inc();
        let families = registry.gather();
        assert!(families
            .iter()
            .any(|family| family.get_name() == "relay_forward_requests_total"));
    }
}
