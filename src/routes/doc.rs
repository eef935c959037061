use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        bookings::{BookingList, BookingWithItems},
        cart::{CartItemDto, CartList},
        invoices::{InvoiceList, InvoiceWithItems},
        orders::{OrderList, OrderWithItems},
        products::{ProductList, ProductWithImages},
        queries::QueryList,
    },
    models::{
        Booking, BookingItem, CartItem, ContactQuery, Invoice, InvoiceItem, Order, OrderItem,
        Product, ProductImage, User,
    },
    response::{ApiResponse, Meta},
    routes::{admin, auth, bookings, cart, health, invoices, orders, params, products, queries},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::profile,
        auth::update,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        bookings::create_booking,
        orders::create_order,
        orders::list_orders,
        orders::get_order,
        invoices::create_invoice,
        invoices::list_invoices,
        invoices::get_invoice,
        invoices::update_invoice,
        invoices::delete_invoice,
        cart::cart_list,
        cart::add_to_cart,
        cart::remove_from_cart,
        cart::clear_cart,
        queries::create_query,
        queries::list_queries,
        queries::update_query_status,
        admin::list_bookings,
        admin::get_booking,
        admin::update_booking_status,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::update_payment_status,
        admin::list_low_stock
    ),
    components(
        schemas(
            User,
            Product,
            ProductImage,
            Booking,
            BookingItem,
            Order,
            OrderItem,
            Invoice,
            InvoiceItem,
            CartItem,
            ContactQuery,
            ProductList,
            ProductWithImages,
            BookingList,
            BookingWithItems,
            OrderList,
            OrderWithItems,
            InvoiceList,
            InvoiceWithItems,
            CartList,
            CartItemDto,
            QueryList,
            crate::services::admin_service::ProductList,
            crate::services::admin_service::LowStockQuery,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            params::BookingListQuery,
            params::InvoiceListQuery,
            params::QueryListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<Booking>,
            ApiResponse<BookingWithItems>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<InvoiceWithItems>,
            ApiResponse<InvoiceList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication and profile endpoints"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Bookings", description = "Public checkout endpoint"),
        (name = "Orders", description = "Authenticated order endpoints"),
        (name = "Invoices", description = "Invoice back-office endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Queries", description = "Contact-form endpoints"),
        (name = "Admin", description = "Back-office endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
