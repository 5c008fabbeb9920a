//! Core services of the single-step purchase flow.
//!
//! Data flows strictly downward: the type resolver's output feeds cart
//! acquisition; the acquired order feeds gateway selection and payment
//! method provisioning; their outputs feed payment completion; the
//! orchestrator sequences all of it and is the only component the
//! presentation layer calls.

pub mod cart;
pub mod completer;
pub mod gateway;
pub mod orchestrator;
pub mod provisioner;
pub mod type_resolver;

pub use cart::CartAcquirer;
pub use completer::{
    ManualGateway, PaymentCompleter, PaymentExecutor, PaymentReceipt, PaymentRequest,
};
pub use gateway::{
    GatewayConditions, EnabledGateways, PaymentGatewaySelector, PaymentOption, PaymentOptions,
    NEW_METHOD_OPTION_PREFIX,
};
pub use orchestrator::{
    CheckoutForm, CheckoutOrchestrator, CustomerContext, SubmitValues, OTHER_AMOUNT_SENTINEL,
};
pub use provisioner::{PaymentMethodProvisioner, PreparedPaymentMethod};
pub use type_resolver::{TypeChain, TypeResolver};
