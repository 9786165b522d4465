pub mod mock;
pub mod phonepe;
pub mod razorpay;
pub mod stripe;

pub use mock::MockGateway;
pub use phonepe::{PhonepeConfig, PhonepeGateway};
pub use razorpay::{RazorpayConfig, RazorpayGateway};
pub use stripe::{StripeConfig, StripeGateway};
