//! REST adapters for the external collaborators of the triage gateway.
//!
//! Every adapter is a thin stateless wrapper over a `reqwest::Client`,
//! exposed through an `async_trait` seam in [`traits`] so the dialogue
//! controller can be exercised against mocks.  None of the adapters
//! retries: failures surface as typed errors and the controller decides
//! how the conversation recovers.

pub mod directory;
pub mod encyclopedia;
pub mod geocode;
pub mod intent;
pub mod medical;
pub mod messaging;
pub mod traits;

pub use directory::{
    Doctor, DoctorProfile, Practice, PracticePhone, RestDirectoryClient, Specialty, VisitAddress,
};
pub use encyclopedia::{ArticleSummary, RestEncyclopediaClient};
pub use geocode::RestGeocodingClient;
pub use intent::{IntentMessage, IntentReply, RestIntentClient};
pub use medical::{DiagnosisExtras, DiagnosisRequest, DiagnosisResponse, RestMedicalClient};
pub use messaging::{
    OutboundMessage, PersonProfile, PlatformMessage, RestMessagingClient, WebhookInfo,
};
pub use traits::{
    DirectoryService, EncyclopediaService, GeocodingService, IntentService, MedicalService,
    MessagingService,
};
