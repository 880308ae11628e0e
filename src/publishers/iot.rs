use super::{PublishError, Publisher};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_iotdataplane::error::{DisplayErrorContext, SdkError};
use aws_sdk_iotdataplane::operation::publish::PublishError as IotPublishError;
use aws_sdk_iotdataplane::primitives::Blob;
use aws_sdk_iotdataplane::Client;
use std::fmt::Debug;
use tracing::{debug, info};

#[derive(Clone, Debug, Default)]
pub struct IotConfig {
    /// AWS region. Falls back to the provider chain when unset.
    pub region: Option<String>,
    /// Account data endpoint, e.g. `https://xxxx-ats.iot.us-east-1.amazonaws.com`.
    pub endpoint_url: Option<String>,
    pub qos: i32,
}

pub struct IotDataPublisher {
    client: Client,
    qos: i32,
}

impl IotDataPublisher {
    pub async fn new(config: IotConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(ref region) = config.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }

        if let Some(ref endpoint) = config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;

        info!(
            region = ?sdk_config.region(),
            endpoint = ?config.endpoint_url,
            qos = config.qos,
            "Configured AWS IoT data-plane client"
        );

        Self {
            client: Client::new(&sdk_config),
            qos: config.qos,
        }
    }
}

#[async_trait]
impl Publisher for IotDataPublisher {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        self.client
            .publish()
            .topic(topic)
            .qos(self.qos)
            .payload(Blob::new(payload))
            .send()
            .await
            .map_err(classify)?;

        debug!(topic, bytes = payload.len(), "Published to AWS IoT");
        Ok(())
    }
}

fn classify<R: Debug>(err: SdkError<IotPublishError, R>) -> PublishError {
    let message = DisplayErrorContext(&err).to_string();
    match err.as_service_error() {
        Some(IotPublishError::ThrottlingException(_)) => PublishError::Throttled(message),
        Some(IotPublishError::InternalFailureException(_)) => PublishError::Connection(message),
        Some(_) => PublishError::Rejected(message),
        None => PublishError::Connection(message),
    }
}
