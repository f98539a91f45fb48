// Domain layer - Dashboard models and placement rules
pub mod dashboard;
pub mod ids;
pub mod layout;
pub mod template;
pub mod widget;
