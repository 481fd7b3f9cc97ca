mod check_command;
mod lsp_process;
mod lsp_session;
