pub mod catalog_list;
pub mod element_panel;
pub mod page_view;
pub mod pagination;
