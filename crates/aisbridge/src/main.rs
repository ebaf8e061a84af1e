//! aisbridge: AIS position report ingest binary
//!
//! Streams vessel positions from aisstream.io and republishes PositionReport
//! frames verbatim to a Kafka topic keyed by MMSI.

use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aisbridge_connector_lib::{
    aisstream::{
        parse_bounding_boxes, parse_list, AisStreamConfig, AisStreamConnector, AISSTREAM_WS_URL,
    },
    RecordPublisher, Runner, ServerState, DEFAULT_TOPIC,
};
use aisbridge_middleware::{MiddlewareFactory, TransportConfig, TransportType};

const FEED_NAME: &str = "aisstream";

#[derive(Parser, Debug)]
#[command(name = "aisbridge")]
#[command(about = "Republish aisstream.io position reports to Kafka")]
struct Args {
    /// aisstream.io API key
    #[arg(long, env = "AISSTREAM_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Feed WebSocket endpoint
    #[arg(long, env = "AISSTREAM_URL", default_value = AISSTREAM_WS_URL)]
    feed_url: String,

    /// Regions to subscribe: "lat,lon,lat,lon;..." or "world"
    #[arg(long, env = "BOUNDING_BOXES")]
    bounding_boxes: String,

    /// Comma separated MMSI filter
    #[arg(long, env = "FILTER_MMSI", default_value = "")]
    filter_mmsi: String,

    /// Comma separated message type filter
    #[arg(long, env = "FILTER_MESSAGE_TYPES", default_value = "")]
    filter_message_types: String,

    /// Fail the stream if nothing arrives for this long
    #[arg(long, env = "READ_TIMEOUT_SECS", default_value_t = 120)]
    read_timeout_secs: u64,

    /// Publish transport: kafka or memory
    #[arg(long, env = "TRANSPORT", default_value = "kafka")]
    transport: TransportType,

    /// Kafka bootstrap address
    #[arg(long, env = "BROKER_ADDRESS", default_value = "localhost:9092")]
    broker_address: String,

    /// Destination topic
    #[arg(long, env = "TOPIC_NAME", default_value = DEFAULT_TOPIC)]
    topic_name: String,

    /// Per-record delivery timeout
    #[arg(long, env = "DELIVERY_TIMEOUT_MS", default_value_t = 5000)]
    delivery_timeout_ms: u64,

    /// Health server bind address
    #[arg(long, env = "HEALTH_ADDR", default_value = "0.0.0.0:8080")]
    health_addr: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    if let Err(e) = run(args).await {
        error!(error = %e, "aisbridge failed");
        std::process::exit(1);
    }
    Ok(())
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let health_addr: SocketAddr = args.health_addr.parse()?;

    let bounding_boxes = parse_bounding_boxes(&args.bounding_boxes)?;
    let feed_config = AisStreamConfig::new(args.api_key, bounding_boxes)?
        .with_url(args.feed_url)
        .with_read_timeout(Duration::from_secs(args.read_timeout_secs))
        .with_mmsi_filter(parse_list(&args.filter_mmsi))
        .with_message_type_filter(parse_list(&args.filter_message_types));
    info!(
        url = %feed_config.url,
        boxes = feed_config.bounding_boxes.len(),
        mmsi_filter = feed_config.filter_mmsi.len(),
        type_filter = feed_config.filter_message_types.len(),
        "Loaded feed configuration"
    );

    let transport_config = TransportConfig {
        transport_type: args.transport,
        brokers: args.broker_address,
        delivery_timeout: Duration::from_millis(args.delivery_timeout_ms),
        ..Default::default()
    };
    let transport =
        MiddlewareFactory::create_transport_validated(&transport_config, &args.topic_name).await?;
    info!(
        transport = %transport_config.transport_type,
        brokers = %transport_config.brokers,
        topic = %args.topic_name,
        "Publisher ready"
    );

    let publisher = RecordPublisher::new(transport.clone(), args.topic_name.as_str());
    let connector = AisStreamConnector::new(feed_config);
    let mut runner = Runner::new(FEED_NAME, connector, publisher);

    let server_state = ServerState::new(
        FEED_NAME,
        runner.connected_handle(),
        runner.activity_handle(),
    );
    tokio::spawn(async move {
        if let Err(e) = aisbridge_connector_lib::run_server(health_addr, server_state).await {
            error!(error = %e, "Health server failed");
        }
    });
    info!(addr = %health_addr, "Health server started");

    let outcome = tokio::select! {
        result = runner.run() => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };

    if let Some(result) = outcome {
        let stats = runner.stats();
        error!(
            published = stats.published,
            publish_failures = stats.publish_failures,
            decode_failures = stats.decode_failures,
            "Pipeline stopped"
        );
        return match result {
            Err(e) => Err(e.into()),
            Ok(never) => match never {},
        };
    }
    info!("Received shutdown signal");

    if let Err(e) = transport.flush(transport_config.delivery_timeout).await {
        warn!(error = %e, "Failed to flush pending records");
    }
    let stats = runner.stats();
    info!(
        frames = stats.frames,
        published = stats.published,
        publish_failures = stats.publish_failures,
        "Shutdown complete"
    );
    Ok(())
}
