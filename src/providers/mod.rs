//! External lookup collaborators: the WHOIS client and the VirusTotal
//! reputation API.

pub mod vt;
pub mod whois;
