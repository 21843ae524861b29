pub(crate) mod calendar;
pub(crate) mod rates_errors;
pub(crate) mod rates_model;
pub(crate) mod rates_provider;
pub(crate) mod rates_repository;
pub(crate) mod rates_service;
pub(crate) mod rates_traits;

pub use calendar::{is_business_day, previous_business_day, settlement_date};
pub use rates_errors::RateError;
pub use rates_model::{RateCacheEntry, RateTable};
pub use rates_provider::NbpProvider;
pub use rates_repository::RateRepository;
pub use rates_service::RateService;
pub use rates_traits::{RateProviderTrait, RateRepositoryTrait};
