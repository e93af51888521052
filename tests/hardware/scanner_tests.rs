use barcode_reader::{
    BarcodeDecoder, CandidateNamespace, LineSource, PortConfiguration, PortDiscovery, PortOpener,
    PortSwitcher, ReaderContext, ReaderOptions, SystemPortOpener, DEFAULT_SEPARATOR,
};
use std::env;
use std::sync::{mpsc, Arc};
use std::time::Duration;

/// Test port configuration from environment.
fn test_port() -> Option<(String, PortConfiguration)> {
    let port_name = env::var("TEST_PORT").ok()?;
    let mut config = PortConfiguration::default();
    if let Some(baud) = env::var("TEST_BAUD").ok().and_then(|s| s.parse().ok()) {
        config.baud_rate = baud;
    }
    Some((port_name, config))
}

#[test]
#[ignore]
fn test_real_scanner_is_listed() {
    let Some((name, config)) = test_port() else {
        eprintln!("TEST_PORT not set; skipping");
        return;
    };
    let opener: Arc<dyn PortOpener> = Arc::new(SystemPortOpener::new(config));
    let namespace = CandidateNamespace {
        extra: vec![name.clone()],
        include_system_ports: true,
        ..CandidateNamespace::default()
    };
    let discovery = PortDiscovery::new(ReaderContext::new(DEFAULT_SEPARATOR), opener, namespace);

    let listing = discovery.list_ports();
    assert_eq!(listing.get(&name), Some(false), "listing: {:?}", listing.names());
}

#[test]
#[ignore]
fn test_real_scanner_produces_decodable_token() {
    let Some((name, config)) = test_port() else {
        eprintln!("TEST_PORT not set; skipping");
        return;
    };
    let shared = ReaderContext::new(DEFAULT_SEPARATOR);
    let (tx, rx) = mpsc::channel();
    let reader = LineSource::new(Arc::clone(&shared), tx, ReaderOptions::default())
        .spawn()
        .unwrap();
    let switcher = PortSwitcher::new(shared, Arc::new(SystemPortOpener::new(config)));
    switcher.switch_to(&name).unwrap();

    eprintln!("Scan a 13 or 32 character barcode on {name} within 30 seconds");
    let token = rx.recv_timeout(Duration::from_secs(30)).expect("no scan received");
    let event = BarcodeDecoder::default().decode_now(&token).unwrap();
    eprintln!("Decoded {event:?}");

    reader.shutdown();
}
