pub mod audit_logs;
pub mod booking_items;
pub mod bookings;
pub mod cart_items;
pub mod invoice_items;
pub mod invoices;
pub mod order_items;
pub mod orders;
pub mod product_images;
pub mod products;
pub mod queries;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use booking_items::Entity as BookingItems;
pub use bookings::Entity as Bookings;
pub use cart_items::Entity as CartItems;
pub use invoice_items::Entity as InvoiceItems;
pub use invoices::Entity as Invoices;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use product_images::Entity as ProductImages;
pub use products::Entity as Products;
pub use queries::Entity as Queries;
pub use users::Entity as Users;
