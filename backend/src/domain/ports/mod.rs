//! Domain ports for the hexagonal boundary.
//!
//! Driven ports only: persistence, mail delivery and listing import. Inbound
//! adapters talk to the services in [`crate::domain`] directly.

mod macros;
pub(crate) use macros::define_port_error;

mod listing_importer;
mod mailer;
mod store;

#[cfg(test)]
pub use listing_importer::MockListingImporter;
pub use listing_importer::{DisabledListingImporter, ListingImportError, ListingImporter};
#[cfg(test)]
pub use mailer::MockMailer;
pub use mailer::{DiscardingMailer, Mailer, MailerError};
pub use store::{Deadline, Store, StoreError, UnitOfWork, in_unit_of_work};
