pub mod carton;
pub mod external_move;
pub mod external_partner;
pub mod instrument;
pub mod production_batch;
pub mod production_log;
pub mod qc_record;
pub mod work_order;
