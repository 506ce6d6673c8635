mod facility;

pub use facility::Facility;
