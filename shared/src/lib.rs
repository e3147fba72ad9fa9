pub mod auth;
pub mod email;
pub mod intake;
pub mod types;

use aws_sdk_cognitoidentityprovider::Client as CognitoClient;
use aws_sdk_dynamodb::Client as DynamoClient;
use aws_sdk_sesv2::Client as SesClient;

/// AWS clients shared by every request, built once at cold start.
pub struct AppState {
    pub dynamo_client: DynamoClient,
    pub cognito_client: CognitoClient,
    pub ses_client: SesClient,
}

impl AppState {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            dynamo_client: DynamoClient::new(config),
            cognito_client: CognitoClient::new(config),
            ses_client: SesClient::new(config),
        }
    }
}
