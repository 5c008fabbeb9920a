//! Persistent entities for the single-step purchase flow.
//!
//! Admin-authored type records (product type, variation type, order item
//! type, order type, payment gateway) use string machine names as primary
//! keys; transactional rows use UUIDs.

pub mod billing_profile;
pub mod offer;
pub mod order;
pub mod order_item;
pub mod order_item_type;
pub mod order_type;
pub mod payment;
pub mod payment_gateway;
pub mod payment_method;
pub mod product;
pub mod product_type;
pub mod product_variation;
pub mod product_variation_type;
pub mod store;

pub use billing_profile::{Entity as BillingProfile, Model as BillingProfileModel};
pub use offer::{Entity as Offer, Model as OfferModel};
pub use order::{Entity as Order, Model as OrderModel, OrderState};
pub use order_item::{Entity as OrderItem, Model as OrderItemModel};
pub use order_item_type::{Entity as OrderItemType, Model as OrderItemTypeModel};
pub use order_type::{Entity as OrderType, Model as OrderTypeModel};
pub use payment::{Entity as Payment, Model as PaymentModel, PaymentState};
pub use payment_gateway::{Entity as PaymentGateway, Model as PaymentGatewayModel};
pub use payment_method::{Entity as PaymentMethod, Model as PaymentMethodModel};
pub use product::{Entity as Product, Model as ProductModel};
pub use product_type::{Entity as ProductType, Model as ProductTypeModel};
pub use product_variation::{Entity as ProductVariation, Model as ProductVariationModel};
pub use product_variation_type::{
    Entity as ProductVariationType, Model as ProductVariationTypeModel,
};
pub use store::{Entity as Store, Model as StoreModel};
