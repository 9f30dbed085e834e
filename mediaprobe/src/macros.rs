macro_rules! try_vec {
	($elem:expr; $size:expr) => {{ $crate::util::alloc::fallible_vec_from_element($elem, $size)? }};
}

// Shorthand for return Err(ProbeError::new(ErrorKind::Foo))
//
// Usage:
// - err!(Variant)        -> return Err(ProbeError::new(ErrorKind::Variant))
// - err!(Variant(inner)) -> return Err(ProbeError::new(ErrorKind::Variant(inner)))
macro_rules! err {
	($variant:ident) => {
		return Err(crate::error::ProbeError::new(
			crate::error::ErrorKind::$variant,
		))
	};
	($variant:ident($inner:expr)) => {
		return Err(crate::error::ProbeError::new(
			crate::error::ErrorKind::$variant($inner),
		))
	};
}

// Shorthand for CorruptStreamError::new(FileType::Foo, offset, "Message")
//
// Usage:
//
// - corrupt_err!(Variant, offset, Message)
//
// or bail:
//
// - corrupt_err!(@BAIL Variant, offset, Message)
macro_rules! corrupt_err {
	($file_ty:ident, $offset:expr, $reason:literal) => {
		Into::<crate::error::ProbeError>::into(crate::error::CorruptStreamError::new(
			crate::probe::FileType::$file_ty,
			$offset,
			$reason,
		))
	};
	(@BAIL $file_ty:ident, $offset:expr, $reason:literal) => {
		return Err(corrupt_err!($file_ty, $offset, $reason))
	};
}

pub(crate) use {corrupt_err, err, try_vec};
