//! Macros for reducing boilerplate when defining catalog records
//!
//! Every record carries `id`, `created_at` and `updated_at` fields; these
//! macros generate the matching `Entity`/`Owned` implementations.

/// Implement `Entity` (and `Owned`) for a record struct
///
/// The struct must have `id: Uuid`, `created_at` and `updated_at` fields.
/// Pass `owner: <field>` to read the owner from a field holding a `Uuid`
/// or an `Option<Uuid>`; without it the record has no owner.
///
/// # Example
/// ```rust,ignore
/// impl_entity!(Category, "categories", "category");
/// impl_entity!(Product, "products", "product", owner: user);
/// ```
#[macro_export]
macro_rules! impl_entity {
    (@entity $type:ident, $plural:expr, $singular:expr) => {
        impl $crate::core::entity::Entity for $type {
            fn resource_name() -> &'static str {
                $plural
            }

            fn resource_name_singular() -> &'static str {
                $singular
            }

            fn id(&self) -> ::uuid::Uuid {
                self.id
            }

            fn created_at(&self) -> ::chrono::DateTime<::chrono::Utc> {
                self.created_at
            }

            fn updated_at(&self) -> ::chrono::DateTime<::chrono::Utc> {
                self.updated_at
            }
        }

        impl $type {
            /// Update the updated_at timestamp to now
            pub fn touch(&mut self) {
                self.updated_at = ::chrono::Utc::now();
            }
        }
    };

    ($type:ident, $plural:expr, $singular:expr, owner: $owner:ident) => {
        $crate::impl_entity!(@entity $type, $plural, $singular);

        impl $crate::core::entity::Owned for $type {
            fn owner_id(&self) -> Option<::uuid::Uuid> {
                ::std::option::Option::<::uuid::Uuid>::from(self.$owner)
            }
        }
    };

    ($type:ident, $plural:expr, $singular:expr) => {
        $crate::impl_entity!(@entity $type, $plural, $singular);

        impl $crate::core::entity::Owned for $type {}
    };
}
