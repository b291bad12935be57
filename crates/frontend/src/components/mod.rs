pub mod candidate_popup;
pub mod chat_panel;
pub mod map_view;
pub mod notices;
pub mod place_panel;
pub mod poi_filter;
pub mod search_box;
pub mod travel_panel;
