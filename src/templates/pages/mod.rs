pub mod import;
pub mod lead_detail;
pub mod lead_form;
pub mod leads;
pub mod signin;

pub use import::{import_page, ImportResult};
pub use lead_detail::lead_detail_page;
pub use lead_form::{lead_form_page, LeadFormVm};
pub use leads::{leads_page, LeadsVm};
pub use signin::signin_page;
