//! Business logic services for the Warehouse Stock Ledger

pub mod dashboard;
pub mod document_number;
pub mod items;
pub mod ledger;
pub mod orchestrator;
pub mod purchase;
pub mod records;
pub mod sale;

pub use dashboard::DashboardService;
pub use document_number::{DocumentNumberGenerator, DocumentNumberSource};
pub use items::ItemService;
pub use ledger::StockLedger;
pub use orchestrator::TransactionOrchestrator;
pub use purchase::PurchaseService;
pub use records::TransactionRecordStore;
pub use sale::SaleService;
