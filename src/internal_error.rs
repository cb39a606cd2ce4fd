use rusqlite;
use std::error::Error;
use std::io::{self, Cursor};

use std::fmt;
use std::sync::PoisonError;

use rocket::http::{ContentType, Status};
use rocket::request::Request;
use rocket::response::{self, Responder, Response};

#[derive(Debug)]
pub struct InternalError {
    what: String,
    status: Status,
}

impl InternalError {
    pub fn bad_request(what: impl Into<String>) -> InternalError {
        InternalError {
            what: what.into(),
            status: Status::BadRequest,
        }
    }

    pub fn not_found(what: impl Into<String>) -> InternalError {
        InternalError {
            what: what.into(),
            status: Status::NotFound,
        }
    }
}

impl Error for InternalError {}
impl fmt::Display for InternalError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Internal error: {}", self.what)
    }
}

impl<'r> Responder<'r, 'static> for InternalError {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        Response::build()
            .status(self.status)
            .header(ContentType::Plain)
            .sized_body(self.what.len(), Cursor::new(self.what))
            .ok()
    }
}

impl<T> From<PoisonError<T>> for InternalError {
    fn from(e: PoisonError<T>) -> InternalError {
        InternalError {
            what: e.to_string(),
            status: Status::InternalServerError,
        }
    }
}

impl From<rusqlite::Error> for InternalError {
    fn from(e: rusqlite::Error) -> InternalError {
        InternalError {
            what: e.to_string(),
            status: Status::InternalServerError,
        }
    }
}

impl From<io::Error> for InternalError {
    fn from(e: io::Error) -> InternalError {
        InternalError {
            what: e.to_string(),
            status: Status::InternalServerError,
        }
    }
}

impl From<serde_json::Error> for InternalError {
    fn from(e: serde_json::Error) -> InternalError {
        InternalError {
            what: e.to_string(),
            status: Status::InternalServerError,
        }
    }
}

impl From<ureq::Error> for InternalError {
    fn from(e: ureq::Error) -> InternalError {
        InternalError {
            what: e.to_string(),
            status: Status::BadGateway,
        }
    }
}

impl From<chrono::ParseError> for InternalError {
    fn from(e: chrono::ParseError) -> InternalError {
        InternalError {
            what: e.to_string(),
            status: Status::InternalServerError,
        }
    }
}

impl From<regex::Error> for InternalError {
    fn from(e: regex::Error) -> InternalError {
        InternalError {
            what: e.to_string(),
            status: Status::InternalServerError,
        }
    }
}

impl From<&str> for InternalError {
    fn from(s: &str) -> InternalError {
        InternalError {
            what: s.to_string(),
            status: Status::InternalServerError,
        }
    }
}

impl From<String> for InternalError {
    fn from(s: String) -> InternalError {
        InternalError {
            what: s,
            status: Status::InternalServerError,
        }
    }
}

pub type InternalResult<T> = Result<T, InternalError>;
