/// Prompt 模板、动态变量与函数工具定义
pub mod invoice;
pub mod template;
pub mod tools;

pub use invoice::InvoiceReminder;
pub use template::{merge_variables, variables_to_fields, DynamicVariables, PromptTemplate};
pub use tools::{FunctionSpec, FunctionTool, FunctionToolBuilder, ParameterSchema};
