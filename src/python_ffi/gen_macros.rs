/// Wraps a value that a Python method can hand over to another Python object, leaving
/// this one consumed. Access to a consumed object raises `RuntimeError`.
#[macro_export]
macro_rules! MakeConsumable {
    ($name:ident,$inner_type:tt,$obj_name:ident) => {
        pub(super) struct $name {
            obj: Option<$inner_type>,
        }
        impl $name {
            pub(super) fn acquire(val: $inner_type) -> Self {
                Self { obj: Some(val) }
            }
            fn consumed() -> pyo3::PyErr {
                pyo3::exceptions::PyRuntimeError::new_err(std::stringify!(
                    This $obj_name object is consumed and cannot be used
                ))
            }
            fn get_ref(&self) -> pyo3::PyResult<&$inner_type> {
                self.obj.as_ref().ok_or_else(Self::consumed)
            }
            fn get_ref_mut(&mut self) -> pyo3::PyResult<&mut $inner_type> {
                self.obj.as_mut().ok_or_else(Self::consumed)
            }
            fn release(&mut self) -> pyo3::PyResult<$inner_type> {
                self.obj.take().ok_or_else(Self::consumed)
            }
        }
    };
}

#[macro_export]
macro_rules! Impl_to_PyErr {
    (for $($t:ty),+) => {
        $(impl From<$t> for pyo3::PyErr {
            fn from(err: $t) -> Self {
                pyo3::exceptions::PyValueError::new_err(format!("{}", err))
            }
        }
        )*
    }
}
